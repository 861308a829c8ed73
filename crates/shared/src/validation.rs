//! Common validation utilities.

use validator::ValidationError;

/// Smallest accepted donation in minor currency units (1.00).
pub const MIN_DONATION_MINOR_UNITS: i64 = 100;

/// Maximum length of a generated slug.
const MAX_SLUG_LENGTH: usize = 80;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Lower-cases and trims an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns true when the address has the basic `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Validator hook for email fields.
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(&normalize_email(email)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}

/// Validator hook for slug fields.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) && slug.len() <= MAX_SLUG_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug_format");
        err.message = Some("Slug must be lowercase letters, digits and single hyphens".into());
        Err(err)
    }
}

/// Builds a URL slug from free text, e.g. `"Summer Fun Day!"` -> `"summer-fun-day"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Builds a file-system safe name for downloads, e.g. CSV exports.
pub fn safe_filename(text: &str, fallback: &str) -> String {
    let name = slugify(text).replace('-', "_");
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

/// Converts a major-unit amount (e.g. pounds) to minor units (pence).
/// Amounts with fractions of a minor unit are rejected rather than rounded.
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let scaled = amount * 100.0;
    let minor = scaled.round();
    if (scaled - minor).abs() > 1e-6 || minor > i64::MAX as f64 {
        return None;
    }
    Some(minor as i64)
}

/// Converts minor units back to major units for display.
pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_fake_emails_are_valid() {
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            assert!(is_valid_email(&email), "{email}");
        }
    }

    #[test]
    fn test_validate_email_shape_message() {
        let err = validate_email_shape("broken").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Invalid email address");
        assert!(validate_email_shape(" Mixed@Case.Org ").is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Summer Fun Day!"), "summer-fun-day");
        assert_eq!(slugify("  --Leading and trailing--  "), "leading-and-trailing");
        assert_eq!(slugify("Café & Crafts 2025"), "caf-crafts-2025");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("family-picnic").is_ok());
        assert!(validate_slug("Family-Picnic").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("Easter Egg Hunt", "export"), "easter_egg_hunt");
        assert_eq!(safe_filename("???", "export"), "export");
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(1.0), Some(100));
        assert_eq!(to_minor_units(12.34), Some(1234));
        assert_eq!(to_minor_units(0.1 + 0.2), Some(30));
        assert_eq!(to_minor_units(-1.0), None);
        assert_eq!(to_minor_units(f64::NAN), None);
        assert_eq!(to_minor_units(0.995), None);
        assert_eq!(to_minor_units(10.001), None);
        assert_eq!(to_minor_units(0.99), Some(99));
        assert_eq!(from_minor_units(2550), 25.5);
    }
}
