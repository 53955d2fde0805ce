//! Request body validation.

use salvo::oapi::extract::JsonBody;

use crate::errors::{ApiError, FieldError};

/// Checks a request body before it reaches a service.
pub(crate) trait Validate {
    /// Push one [`FieldError`] per invalid field.
    fn validate(&self, errors: &mut Vec<FieldError>);
}

/// Unwrap a JSON body, rejecting it with a 400 listing every invalid field.
pub(crate) fn validated<T>(body: JsonBody<T>) -> Result<T, ApiError>
where
    T: Validate,
{
    let body = body.into_inner();
    let mut errors = Vec::new();

    body.validate(&mut errors);

    if errors.is_empty() {
        Ok(body)
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Collects field errors with small reusable checks.
#[derive(Debug)]
pub(crate) struct Checks<'a> {
    errors: &'a mut Vec<FieldError>,
}

impl<'a> Checks<'a> {
    pub(crate) fn new(errors: &'a mut Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub(crate) fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    /// Required text: non-blank and at most `max` characters.
    pub(crate) fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "is required")
        } else {
            self.length(field, value, max)
        }
    }

    /// Optional text: when present, non-blank and at most `max` characters.
    pub(crate) fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        match value {
            Some(value) => self.text(field, value, max),
            None => self,
        }
    }

    pub(crate) fn length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.fail(field, format!("must be at most {max} characters"))
        } else {
            self
        }
    }

    pub(crate) fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + std::fmt::Display,
    {
        if value < min || value > max {
            self.fail(field, format!("must be between {min} and {max}"))
        } else {
            self
        }
    }
}
