use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::RwLock;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern compiles");
    static ref DEFAULT_REDACTOR: RwLock<PiiRedactor> = RwLock::new(PiiRedactor::default());
}

/// Redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub redact_emails: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_emails: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Redactor for log messages
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Logins are not pattern-detectable, so callers redact them explicitly
    pub fn redact_login(&self, login: &str) -> String {
        if !self.config.enabled || login.is_empty() {
            return login.to_string();
        }
        if self.config.hash_for_correlation {
            format!("LOGIN[{}]", self.hash_value(login))
        } else {
            let first: String = login.chars().take(1).collect();
            format!("{}***", first)
        }
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = &caps[0];
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    match email.split_once('@') {
                        Some((local, domain)) => {
                            let l: String = local.chars().take(1).collect();
                            let d: String = domain.chars().take(1).collect();
                            format!("{}***@{}***", l, d)
                        }
                        None => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.to_lowercase().as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD_NO_PAD.encode(&result[..8])
    }
}

/// Replace the process-wide redactor used by [`redact`] and the macros
pub fn configure_default_redactor(config: RedactionConfig) {
    match DEFAULT_REDACTOR.write() {
        Ok(mut guard) => *guard = PiiRedactor::new(config),
        Err(poisoned) => *poisoned.into_inner() = PiiRedactor::new(config),
    }
}

/// Redact free text with the process-wide redactor
pub fn redact(text: &str) -> String {
    match DEFAULT_REDACTOR.read() {
        Ok(guard) => guard.redact(text),
        Err(poisoned) => poisoned.into_inner().redact(text),
    }
}

/// Redact a login with the process-wide redactor
pub fn redact_login(login: &str) -> String {
    match DEFAULT_REDACTOR.read() {
        Ok(guard) => guard.redact_login(login),
        Err(poisoned) => poisoned.into_inner().redact_login(login),
    }
}
