/// Name of the unique constraint on `tokens.token_id`.
pub const TOKEN_ID_CONSTRAINT: &str = "tokens_token_id_key";

pub fn is_duplicate_token_id(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(TOKEN_ID_CONSTRAINT))
}
