//! Request validation
//!
//! Each inbound operation declares an ordered [`RuleSet`]: per field, a list of
//! sanitizers (applied first, as pure transforms) followed by checks. Fields are
//! evaluated independently and every failing check contributes its own
//! [`FieldError`], in declaration order. Validation never touches the store.
//!
//! Length limits count characters of the value as the client sent it (after
//! trimming), not of its HTML-escaped form.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::{ValidateEmail, ValidateLength};

use crate::models::{
    book::BookInput,
    user::{LoginInput, RegisterInput},
};

/// Maximum length of a book title or author
pub const BOOK_FIELD_MAX_LEN: u64 = 150;

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").expect("valid regex"));
static SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!@#$%&?*]").expect("valid regex"));

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

/// Ordered list of rule violations for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// Messages reported for `field`, in rule order
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Sanitizer {
    Trim,
    Escape,
    NormalizeEmail,
}

#[derive(Debug, Clone, Copy)]
enum Check {
    Required,
    IsString,
    Length { min: u64, max: Option<u64> },
    Email,
    PositiveInt,
    Matches(&'static Lazy<Regex>),
}

/// Value of a field as received, then as sanitized
struct RawField {
    is_string: bool,
    value: String,
    /// Sanitized value minus HTML escaping
    unescaped: String,
}

impl RawField {
    fn from_json(value: Option<&Value>) -> Self {
        let (is_string, value) = match value {
            None | Some(Value::Null) => (true, String::new()),
            Some(Value::String(s)) => (true, s.clone()),
            // Scalars are coerced to their textual form
            Some(Value::Number(n)) => (true, n.to_string()),
            Some(Value::Bool(b)) => (true, b.to_string()),
            Some(Value::Array(_)) | Some(Value::Object(_)) => (false, String::new()),
        };
        Self {
            is_string,
            unescaped: value.clone(),
            value,
        }
    }
}

impl Check {
    fn passes(&self, field: &RawField) -> bool {
        let value = field.value.as_str();
        match self {
            Check::Required => !value.is_empty(),
            Check::IsString => field.is_string,
            Check::Length { min, max } => field.unescaped.validate_length(Some(*min), *max, None),
            Check::Email => field.value.validate_email(),
            Check::PositiveInt => parse_positive_int(value).is_some(),
            Check::Matches(regex) => regex.is_match(value),
        }
    }
}

/// Rules for one field of the input
pub struct FieldRules {
    field: &'static str,
    sanitizers: Vec<Sanitizer>,
    checks: Vec<(Check, &'static str)>,
}

impl FieldRules {
    pub fn field(field: &'static str) -> Self {
        Self {
            field,
            sanitizers: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn trim(mut self) -> Self {
        self.sanitizers.push(Sanitizer::Trim);
        self
    }

    pub fn escape(mut self) -> Self {
        self.sanitizers.push(Sanitizer::Escape);
        self
    }

    pub fn normalize_email(mut self) -> Self {
        self.sanitizers.push(Sanitizer::NormalizeEmail);
        self
    }

    pub fn required(self, message: &'static str) -> Self {
        self.check(Check::Required, message)
    }

    pub fn string(self, message: &'static str) -> Self {
        self.check(Check::IsString, message)
    }

    pub fn length(self, min: u64, max: Option<u64>, message: &'static str) -> Self {
        self.check(Check::Length { min, max }, message)
    }

    pub fn email(self, message: &'static str) -> Self {
        self.check(Check::Email, message)
    }

    pub fn positive_int(self, message: &'static str) -> Self {
        self.check(Check::PositiveInt, message)
    }

    pub fn matches(self, regex: &'static Lazy<Regex>, message: &'static str) -> Self {
        self.check(Check::Matches(regex), message)
    }

    fn check(mut self, check: Check, message: &'static str) -> Self {
        self.checks.push((check, message));
        self
    }

    fn sanitize(&self, raw: RawField) -> RawField {
        self.sanitizers.iter().fold(raw, |field, sanitizer| match sanitizer {
            Sanitizer::Trim => RawField {
                value: field.value.trim().to_string(),
                unescaped: field.unescaped.trim().to_string(),
                ..field
            },
            Sanitizer::Escape => RawField {
                value: escape_html(&field.value),
                ..field
            },
            Sanitizer::NormalizeEmail => RawField {
                value: normalize_email(&field.value),
                unescaped: normalize_email(&field.unescaped),
                ..field
            },
        })
    }
}

/// Ordered rule declarations for one operation
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

/// Sanitized field values of an input that passed its rule set
#[derive(Debug, Default)]
pub struct Sanitized(HashMap<&'static str, String>);

impl Sanitized {
    /// Take the sanitized value of a declared field
    pub fn take(&mut self, field: &str) -> String {
        self.0.remove(field).unwrap_or_default()
    }
}

impl RuleSet {
    pub fn new(fields: Vec<FieldRules>) -> Self {
        Self { fields }
    }

    /// Sanitize and check every declared field of `input`
    pub fn apply(&self, input: &Value) -> Result<Sanitized, ValidationErrors> {
        let mut errors = Vec::new();
        let mut sanitized = Sanitized::default();

        for rules in &self.fields {
            let field = rules.sanitize(RawField::from_json(input.get(rules.field)));
            for (check, message) in &rules.checks {
                if !check.passes(&field) {
                    errors.push(FieldError {
                        field: rules.field.to_string(),
                        message: (*message).to_string(),
                    });
                }
            }
            sanitized.0.insert(rules.field, field.value);
        }

        if errors.is_empty() {
            Ok(sanitized)
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

static BOOK_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(vec![
        FieldRules::field("title")
            .trim()
            .escape()
            .required("Title is required")
            .string("Title must be string")
            .length(0, Some(BOOK_FIELD_MAX_LEN), "Title must not exceed 150 characters long"),
        FieldRules::field("author")
            .trim()
            .escape()
            .required("Author is required")
            .string("Author must be string")
            .length(0, Some(BOOK_FIELD_MAX_LEN), "Author must not exceed 150 characters long"),
    ])
});

static BOOK_ID_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(vec![FieldRules::field("bookid")
        .trim()
        .escape()
        .required("bookid is required")
        .positive_int("bookid must be positive integer")])
});

static REGISTER_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(vec![
        FieldRules::field("username")
            .trim()
            .escape()
            .required("username is required")
            .length(3, Some(20), "username must be between 3 and 20 characters long"),
        FieldRules::field("email")
            .trim()
            .normalize_email()
            .email("Email address is not valid")
            .required("Email address is required"),
        FieldRules::field("password")
            .trim()
            .required("Password is required")
            .length(8, None, "Password must be at least 8 characters long")
            .matches(&UPPERCASE, "Password must contain at least one uppercase letter")
            .matches(&LOWERCASE, "Password must contain at least one lowercase letter")
            .matches(&DIGIT, "Password must contain at least one number")
            .matches(&SPECIAL, "Password must contain at least one special character"),
        FieldRules::field("first_name").trim().escape(),
        FieldRules::field("last_name").trim().escape(),
    ])
});

static LOGIN_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(vec![
        FieldRules::field("username")
            .trim()
            .escape()
            .required("username is required")
            .string("username must be string"),
        // Not escaped: must compare equal to the password given at registration
        FieldRules::field("password")
            .trim()
            .required("password is required")
            .string("password must be string"),
    ])
});

/// Validate a create/update book body
pub fn book(input: &Value) -> Result<BookInput, ValidationErrors> {
    let mut fields = BOOK_RULES.apply(input)?;
    Ok(BookInput {
        title: fields.take("title"),
        author: fields.take("author"),
    })
}

/// Validate a `:bookid` path parameter
pub fn book_id(raw: &str) -> Result<i32, ValidationErrors> {
    let input = serde_json::json!({ "bookid": raw });
    let mut fields = BOOK_ID_RULES.apply(&input)?;
    parse_positive_int(&fields.take("bookid")).ok_or_else(|| {
        ValidationErrors(vec![FieldError {
            field: "bookid".to_string(),
            message: "bookid must be positive integer".to_string(),
        }])
    })
}

/// Validate an update: body rules first, then the path id
pub fn book_update(raw_id: &str, input: &Value) -> Result<(i32, BookInput), ValidationErrors> {
    match (book(input), book_id(raw_id)) {
        (Ok(book), Ok(id)) => Ok((id, book)),
        (body, id) => {
            let mut errors = body.err().map(ValidationErrors::into_inner).unwrap_or_default();
            errors.extend(id.err().map(ValidationErrors::into_inner).unwrap_or_default());
            Err(ValidationErrors(errors))
        }
    }
}

/// Validate a registration body
pub fn registration(input: &Value) -> Result<RegisterInput, ValidationErrors> {
    let mut fields = REGISTER_RULES.apply(input)?;
    Ok(RegisterInput {
        username: fields.take("username"),
        email: fields.take("email"),
        password: fields.take("password"),
        first_name: non_empty(fields.take("first_name")),
        last_name: non_empty(fields.take("last_name")),
    })
}

/// Validate a login body
pub fn login(input: &Value) -> Result<LoginInput, ValidationErrors> {
    let mut fields = LOGIN_RULES.apply(input)?;
    Ok(LoginInput {
        username: fields.take("username"),
        password: fields.take("password"),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_positive_int(value: &str) -> Option<i32> {
    if value.is_empty() || !value.trim_start_matches('+').chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<i32>().ok().filter(|n| *n >= 1)
}

/// Replace characters meaningful to HTML with their entities
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il", "hotmail.co.nz",
    "hotmail.co.th", "hotmail.co.uk", "hotmail.com", "hotmail.com.ar", "hotmail.com.mx",
    "hotmail.de", "hotmail.es", "hotmail.fr", "hotmail.hu", "hotmail.it", "hotmail.lt",
    "hotmail.lv", "hotmail.my", "hotmail.ph", "hotmail.pt", "hotmail.se", "hotmail.sg",
    "hotmail.sk", "live.at", "live.be", "live.ca", "live.cl", "live.cn", "live.co.kr",
    "live.co.uk", "live.com", "live.com.ar", "live.com.au", "live.com.mx", "live.com.my",
    "live.com.ph", "live.com.pt", "live.de", "live.dk", "live.fr", "live.hk", "live.ie",
    "live.in", "live.it", "live.jp", "live.nl", "live.no", "live.ru", "live.se", "msn.com",
    "outlook.at", "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.my", "outlook.com.ph",
    "outlook.com.pt", "outlook.de", "outlook.dk", "outlook.es", "outlook.fr", "outlook.hu",
    "outlook.id", "outlook.ie", "outlook.in", "outlook.it", "outlook.jp", "outlook.kr",
    "outlook.lv", "outlook.my", "outlook.ph", "outlook.pt", "outlook.sa", "outlook.sg",
    "outlook.sk", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de", "yahoo.fr",
    "yahoo.in", "yahoo.it", "ymail.com",
];

const YANDEX_DOMAINS: &[&str] = &["yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru"];

/// Canonical form of an email address.
///
/// Lowercases the whole address, then applies provider rules:
/// - Gmail: drop dots and any `+tag`, `googlemail.com` becomes `gmail.com`
/// - iCloud and Outlook/Hotmail/Live: drop any `+tag`
/// - Yahoo: drop the last `-tag`
/// - Yandex: every Yandex domain becomes `yandex.ru`
///
/// Values that are not of the form `local@domain` are returned unchanged.
pub fn normalize_email(value: &str) -> String {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return value.to_string();
    };
    if local.is_empty() || domain.is_empty() {
        return value.to_string();
    }

    let mut local = local.to_lowercase();
    let mut domain = domain.to_lowercase();
    let provider = domain.as_str();

    if GMAIL_DOMAINS.contains(&provider) {
        local = strip_plus_tag(&local).replace('.', "");
        domain = "gmail.com".to_string();
    } else if ICLOUD_DOMAINS.contains(&provider) || OUTLOOK_DOMAINS.contains(&provider) {
        local = strip_plus_tag(&local).to_string();
    } else if YAHOO_DOMAINS.contains(&provider) {
        if let Some((head, _)) = local.rsplit_once('-') {
            local = head.to_string();
        }
    } else if YANDEX_DOMAINS.contains(&provider) {
        domain = "yandex.ru".to_string();
    }

    format!("{}@{}", local, domain)
}

fn strip_plus_tag(local: &str) -> &str {
    local.split_once('+').map_or(local, |(head, _)| head)
}
