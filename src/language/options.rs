//! Closed option sets accepted by the language tools.
//!
//! Tool arguments arrive as free-form strings. They are parsed once at the tool boundary into the
//! enums below and carried as typed values from then on, so an unknown category can never reach
//! the remote service.

use serde::{Serialize, Serializer};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

/// Characters the service accepts as a redaction mask.
pub const REDACTION_CHARACTERS: [char; 13] =
    ['*', '$', '!', '#', '%', '&', '+', '-', '=', '?', '@', '^', '~'];

/// Raised when a tool argument falls outside its closed option set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Value does not name a member of the option set.
    #[error("Invalid value '{value}' for '{field}'. Allowed values are: {allowed}")]
    InvalidValue {
        /// Argument name as exposed in the tool schema.
        field: &'static str,
        /// Raw value supplied by the caller.
        value: String,
        /// Comma separated list of accepted values.
        allowed: String,
    },
}

/// Parse a single option value, reporting the accepted values on failure.
pub fn parse_option<T>(field: &'static str, value: &str) -> Result<T, OptionError>
where
    T: FromStr + IntoEnumIterator + Into<&'static str>,
{
    T::from_str(value.trim()).map_err(|_| OptionError::InvalidValue {
        field,
        value: value.to_string(),
        allowed: allowed_values::<T>(),
    })
}

/// Parse an optional list of option values; `None` and empty lists stay unset.
pub fn parse_option_list<T>(
    field: &'static str,
    values: Option<&[String]>,
) -> Result<Option<Vec<T>>, OptionError>
where
    T: FromStr + IntoEnumIterator + Into<&'static str>,
{
    let Some(values) = values.filter(|values| !values.is_empty()) else {
        return Ok(None);
    };
    values
        .iter()
        .map(|value| parse_option(field, value))
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

/// Validate a redaction mask character.
pub fn parse_redaction_character(value: &str) -> Result<char, OptionError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if REDACTION_CHARACTERS.contains(&ch) => Ok(ch),
        _ => Err(OptionError::InvalidValue {
            field: "redactionCharacter",
            value: value.to_string(),
            allowed: REDACTION_CHARACTERS
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn allowed_values<T>() -> String
where
    T: IntoEnumIterator + Into<&'static str>,
{
    T::iter()
        .map(Into::into)
        .collect::<Vec<&'static str>>()
        .join(", ")
}

macro_rules! serialize_as_wire_name {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(<&'static str>::from(self))
                }
            }
        )+
    };
}

serialize_as_wire_name!(
    PiiCategory,
    EntityCategory,
    RedactionPolicyKind,
    OverlapPolicy,
    SummarizationKind,
    SummaryLength,
    HealthcareDocumentType,
    StringIndexType,
);

/// PII categories recognised by the PII entity recognition task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum PiiCategory {
    Person,
    PersonType,
    PhoneNumber,
    Organization,
    Address,
    Email,
    #[strum(serialize = "URL")]
    Url,
    #[strum(serialize = "IPAddress")]
    IpAddress,
    DateTime,
    Date,
    Age,
    BankAccountNumber,
    CreditCardNumber,
    DriversLicenseNumber,
    PassportNumber,
    #[strum(serialize = "InternationalBankingAccountNumber")]
    Iban,
    #[strum(serialize = "SWIFTCode")]
    SwiftCode,
    #[strum(serialize = "ABARoutingNumber")]
    AbaRoutingNumber,
    #[strum(serialize = "USSocialSecurityNumber")]
    UsSocialSecurityNumber,
    #[strum(serialize = "USIndividualTaxpayerIdentification")]
    UsIndividualTaxpayerIdentification,
    #[strum(serialize = "USUKPassportNumber")]
    UsUkPassportNumber,
    #[strum(serialize = "UKNationalInsuranceNumber")]
    UkNationalInsuranceNumber,
    #[strum(serialize = "UKNationalHealthNumber")]
    UkNationalHealthNumber,
    #[strum(serialize = "EUDriversLicenseNumber")]
    EuDriversLicenseNumber,
    #[strum(serialize = "EUPassportNumber")]
    EuPassportNumber,
    #[strum(serialize = "EUSocialSecurityNumber")]
    EuSocialSecurityNumber,
    #[strum(serialize = "EUTaxIdentificationNumber")]
    EuTaxIdentificationNumber,
    #[strum(serialize = "EUDebitCardNumber")]
    EuDebitCardNumber,
    #[strum(serialize = "AzureDocumentDBAuthKey")]
    AzureDocumentDbAuthKey,
    #[strum(serialize = "AzureStorageAccountKey")]
    AzureStorageAccountKey,
    #[strum(serialize = "SQLServerConnectionString")]
    SqlServerConnectionString,
    All,
    Default,
}

/// Entity categories accepted by inclusion and exclusion lists of entity recognition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum EntityCategory {
    Address,
    Age,
    Airport,
    Area,
    City,
    Continent,
    CountryRegion,
    CulturalEvent,
    Currency,
    Date,
    DateAndTime,
    DateRange,
    DateTime,
    DateTimeRange,
    Dimension,
    Duration,
    Email,
    Event,
    #[strum(serialize = "GPE")]
    Gpe,
    Geological,
    Height,
    #[strum(serialize = "IPAddress")]
    IpAddress,
    Length,
    Location,
    MedicalOrganization,
    NaturalEvent,
    Number,
    NumberRange,
    Numeric,
    Ordinal,
    Organization,
    Percentage,
    Person,
    PersonType,
    PhoneNumber,
    Product,
    Skill,
    Speed,
    SportsEvent,
    SportsOrganization,
    State,
    StockExchange,
    Structural,
    Temperature,
    Time,
    TimeRange,
    #[strum(serialize = "URL")]
    Url,
    Volume,
    Weight,
}

/// How recognised PII is replaced in the redacted output.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum RedactionPolicyKind {
    /// Replace each character with the configured mask character.
    #[default]
    CharacterMask,
    /// Replace each entity with its category name.
    EntityMask,
    /// Leave the text untouched and only report entities.
    NoMask,
}

/// Resolution applied when recognised entities overlap.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum OverlapPolicy {
    /// Keep every entity, even when spans overlap.
    #[strum(serialize = "allowOverlap")]
    AllowOverlap,
    /// Keep the longest entity among overlapping spans.
    #[default]
    #[strum(serialize = "matchLongest")]
    MatchLongest,
}

/// Summarization flavour.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum SummarizationKind {
    /// Generate new sentences that summarise the text.
    #[default]
    #[strum(serialize = "abstractive")]
    Abstractive,
    /// Pick the most relevant sentences from the text.
    #[strum(serialize = "extractive")]
    Extractive,
}

/// Target length of an abstractive summary.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum SummaryLength {
    #[strum(serialize = "short")]
    Short,
    #[default]
    #[strum(serialize = "medium")]
    Medium,
    #[strum(serialize = "long")]
    Long,
}

/// Clinical document type hint for healthcare entity extraction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[allow(missing_docs)]
pub enum HealthcareDocumentType {
    #[default]
    #[strum(serialize = "None")]
    Unspecified,
    ClinicalTrial,
    DischargeSummary,
    ProgressNote,
    HistoryAndPhysical,
    Consult,
    Imaging,
    Pathology,
    ProcedureNote,
}

/// Unit in which the service reports text offsets and lengths.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum StringIndexType {
    /// Grapheme clusters.
    #[strum(serialize = "TextElements_v8")]
    TextElementsV8,
    /// Unicode scalar values.
    UnicodeCodePoint,
    /// UTF-16 code units.
    #[default]
    Utf16CodeUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively_into_wire_names() {
        let category: PiiCategory = parse_option("piiCategories", "ussocialsecuritynumber")
            .expect("category should parse");
        assert_eq!(category, PiiCategory::UsSocialSecurityNumber);
        assert_eq!(
            serde_json::to_value(category).expect("serialize"),
            serde_json::json!("USSocialSecurityNumber")
        );

        let policy: OverlapPolicy =
            parse_option("overlapPolicy", "MatchLongest").expect("policy should parse");
        assert_eq!(policy.to_string(), "matchLongest");
    }

    #[test]
    fn rejects_unknown_values_with_allowed_list() {
        let err = parse_option::<RedactionPolicyKind>("redactionPolicy", "blur")
            .expect_err("unknown policy must fail");
        assert_eq!(
            err.to_string(),
            "Invalid value 'blur' for 'redactionPolicy'. Allowed values are: CharacterMask, EntityMask, NoMask"
        );
    }

    #[test]
    fn empty_lists_stay_unset() {
        let empty: Vec<String> = Vec::new();
        let parsed = parse_option_list::<EntityCategory>("inclusionList", Some(empty.as_slice()))
            .expect("empty list is valid");
        assert!(parsed.is_none());

        let values = vec!["person".to_string(), "url".to_string()];
        let parsed = parse_option_list::<EntityCategory>("inclusionList", Some(values.as_slice()))
            .expect("known categories parse");
        assert_eq!(
            parsed,
            Some(vec![EntityCategory::Person, EntityCategory::Url])
        );
    }

    #[test]
    fn healthcare_document_type_defaults_to_none() {
        assert_eq!(
            serde_json::to_value(HealthcareDocumentType::default()).expect("serialize"),
            serde_json::json!("None")
        );
        let parsed: HealthcareDocumentType =
            parse_option("healthcareDocumentType", "dischargesummary").expect("known type");
        assert_eq!(parsed, HealthcareDocumentType::DischargeSummary);
        let parsed: StringIndexType =
            parse_option("stringIndexType", "textelements_v8").expect("known index type");
        assert_eq!(parsed.to_string(), "TextElements_v8");
    }

    #[test]
    fn redaction_character_must_be_a_single_allowed_symbol() {
        assert_eq!(parse_redaction_character("#"), Ok('#'));
        assert!(parse_redaction_character("x").is_err());
        assert!(parse_redaction_character("**").is_err());
        assert!(parse_redaction_character("").is_err());
    }
}
