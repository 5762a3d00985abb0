#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Job",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Entity not found: Job with id abc");
    }

    #[test]
    fn validation_display() {
        let err = CoreError::Validation("Invalid folder".into());
        assert_eq!(err.to_string(), "Validation failed: Invalid folder");
    }
}
