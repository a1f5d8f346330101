//! Account forms and the field rules they are checked against.
//!
//! Each form lists its rules per field; `validate` runs them in order and
//! collects messages keyed by field name so templates can show them inline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub enum Rule {
    /// Non-blank input. Stops the remaining rules for the field when it fails.
    Required,
    /// Inclusive bounds, counted in characters.
    Length { min: usize, max: usize },
    Email,
    /// Must equal the value of another field.
    EqualTo { other: &'static str, message: &'static str },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().flatten().map(String::as_str)
    }

    fn push(&mut self, field: &'static str, message: String) {
        self.0.entry(field).or_default().push(message);
    }
}

/// A form whose fields can be looked up by name and checked against rules.
pub trait Validate {
    fn rules(&self) -> Vec<(&'static str, Vec<Rule>)>;

    fn value(&self, field: &str) -> &str;

    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        for (field, rules) in self.rules() {
            let value = self.value(field);
            for rule in rules {
                match rule {
                    Rule::Required => {
                        if value.trim().is_empty() {
                            errors.push(field, "This field is required.".into());
                            break;
                        }
                    }
                    Rule::Length { min, max } => {
                        let len = value.chars().count();
                        if len < min || len > max {
                            errors.push(
                                field,
                                format!("Field must be between {min} and {max} characters long."),
                            );
                        }
                    }
                    Rule::Email => {
                        if !is_email(value) {
                            errors.push(field, "Invalid email address.".into());
                        }
                    }
                    Rule::EqualTo { other, message } => {
                        if value != self.value(other) {
                            errors.push(field, message.into());
                        }
                    }
                }
            }
        }
        errors
    }
}

/// Loose structural check: `local@domain.tld`, no whitespace, a single `@`.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !host.starts_with('.') && !host.ends_with('.') && !tld.is_empty()
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

impl Validate for SignupForm {
    fn rules(&self) -> Vec<(&'static str, Vec<Rule>)> {
        vec![
            ("name", vec![Rule::Required, Rule::Length { min: 4, max: 25 }]),
            (
                "password",
                vec![
                    Rule::Required,
                    Rule::EqualTo {
                        other: "confirm",
                        message: "Passwords must match",
                    },
                ],
            ),
            (
                "email",
                vec![Rule::Required, Rule::Length { min: 5, max: 35 }, Rule::Email],
            ),
        ]
    }

    fn value(&self, field: &str) -> &str {
        match field {
            "name" => &self.name,
            "email" => &self.email,
            "password" => &self.password,
            "confirm" => &self.confirm,
            _ => "",
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginForm {
    fn rules(&self) -> Vec<(&'static str, Vec<Rule>)> {
        vec![
            ("email", vec![Rule::Required, Rule::Email]),
            ("password", vec![Rule::Required]),
        ]
    }

    fn value(&self, field: &str) -> &str {
        match field {
            "email" => &self.email,
            "password" => &self.password,
            _ => "",
        }
    }
}
