use validator::ValidationError;

// Os serviços gravam o valor com trim(); só espaços equivale a campo vazio.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank.".into());
        return Err(err);
    }
    Ok(())
}
