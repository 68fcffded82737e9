//! Language utilities for Qt locale codes
//!
//! Qt Linguist files name languages with POSIX-style locale codes such as
//! `fr_FR`, `pt_BR`, `de` or `sr_RS@latin`. This module validates and
//! normalizes those codes and resolves them to English language names for
//! use in prompts.

use anyhow::{Result, anyhow};
use isolang::Language;

/// A parsed locale code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCode {
    /// ISO 639-1 or ISO 639-3 language code, lowercase
    pub language: String,
    /// ISO 3166 region (or UN M.49 area) code, uppercase
    pub region: Option<String>,
    /// Script or variant modifier after `@`
    pub modifier: Option<String>,
}

impl std::fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.language)?;
        if let Some(region) = &self.region {
            write!(f, "_{}", region)?;
        }
        if let Some(modifier) = &self.modifier {
            write!(f, "@{}", modifier)?;
        }
        Ok(())
    }
}

fn lookup_language(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => Language::from_639_3(code),
        _ => None,
    }
}

/// Parse and validate a locale code (`fr_FR`, `pt-br`, `de`, `sr_RS@latin`)
pub fn parse_locale_code(code: &str) -> Result<LocaleCode> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Language code cannot be empty"));
    }

    let (base, modifier) = match trimmed.split_once('@') {
        Some((base, modifier)) => (base, Some(modifier.to_string())),
        None => (trimmed, None),
    };

    let mut parts = base.split(['_', '-']);
    let language = parts.next().unwrap_or_default().to_lowercase();
    let region = parts.next().map(|r| r.to_uppercase());
    if parts.next().is_some() {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    if lookup_language(&language).is_none() {
        return Err(anyhow!("Invalid language code: {}", code));
    }

    if let Some(region) = &region {
        let valid = (region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()))
            || (region.len() == 3 && region.chars().all(|c| c.is_ascii_digit()));
        if !valid {
            return Err(anyhow!("Invalid region in language code: {}", code));
        }
    }

    Ok(LocaleCode { language, region, modifier })
}

/// Normalize a locale code to the `ll_RR` form Qt writes into `.ts` files
pub fn normalize_locale_code(code: &str) -> Result<String> {
    Ok(parse_locale_code(code)?.to_string())
}

/// Get the English language name for a locale code, e.g. `French (FR)`
pub fn get_language_name(code: &str) -> Result<String> {
    let locale = parse_locale_code(code)?;
    let language = lookup_language(&locale.language)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    Ok(match &locale.region {
        Some(region) => format!("{} ({})", language.to_name(), region),
        None => language.to_name().to_string(),
    })
}

/// Whether two locale codes name the same language, ignoring region
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (parse_locale_code(code1), parse_locale_code(code2)) {
        (Ok(a), Ok(b)) => {
            let a = lookup_language(&a.language).map(|l| l.to_639_3());
            let b = lookup_language(&b.language).map(|l| l.to_639_3());
            a.is_some() && a == b
        }
        _ => false,
    }
}
