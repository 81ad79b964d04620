use std::fmt::{self, Display};

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::capability::{Capability, Verification};
use crate::types::MatchResult;

/// Customer data to match against the operator's records.
///
/// Only the fields to be checked are sent: absent and empty fields are
/// omitted from the request body. The phone number is never part of the
/// body as the subject is identified by the access token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct KycMatchRequest {
    /// Identity document number.
    #[serde(skip_serializing_if = "is_blank")]
    pub id_document: Option<String>,

    /// Complete name.
    #[serde(skip_serializing_if = "is_blank")]
    pub name: Option<String>,

    /// First name(s).
    #[serde(skip_serializing_if = "is_blank")]
    pub given_name: Option<String>,

    /// Last name(s).
    #[serde(skip_serializing_if = "is_blank")]
    pub family_name: Option<String>,

    /// Complete name in Hankaku-Kana (Japan only).
    #[serde(skip_serializing_if = "is_blank")]
    pub name_kana_hankaku: Option<String>,

    /// Complete name in Zenkaku-Kana (Japan only).
    #[serde(skip_serializing_if = "is_blank")]
    pub name_kana_zenkaku: Option<String>,

    /// Middle name(s).
    #[serde(skip_serializing_if = "is_blank")]
    pub middle_names: Option<String>,

    /// Last name at birth.
    #[serde(skip_serializing_if = "is_blank")]
    pub family_name_at_birth: Option<String>,

    /// Complete address.
    #[serde(skip_serializing_if = "is_blank")]
    pub address: Option<String>,

    /// Street name.
    #[serde(skip_serializing_if = "is_blank")]
    pub street_name: Option<String>,

    /// Street number.
    #[serde(skip_serializing_if = "is_blank")]
    pub street_number: Option<String>,

    /// Postal code.
    #[serde(skip_serializing_if = "is_blank")]
    pub postal_code: Option<String>,

    /// Region or prefecture.
    #[serde(skip_serializing_if = "is_blank")]
    pub region: Option<String>,

    /// Locality or city.
    #[serde(skip_serializing_if = "is_blank")]
    pub locality: Option<String>,

    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "is_blank")]
    pub country: Option<String>,

    /// House number extension.
    #[serde(skip_serializing_if = "is_blank")]
    pub house_number_extension: Option<String>,

    /// Date of birth (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "is_blank")]
    pub birthdate: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "is_blank")]
    pub email: Option<String>,

    /// Gender.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "empty_gender")]
    pub gender: Option<Gender>,
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

// Forms submit an unselected gender as an empty string.
fn empty_gender<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Gender>, D::Error> {
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if value.is_empty() {
        return Ok(None);
    }
    Gender::deserialize(serde_json::Value::String(value))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

impl KycMatchRequest {
    /// The value provided for a field, if any.
    #[must_use]
    pub fn value(&self, field: KycField) -> Option<&str> {
        let value = match field {
            KycField::IdDocument => &self.id_document,
            KycField::Name => &self.name,
            KycField::GivenName => &self.given_name,
            KycField::FamilyName => &self.family_name,
            KycField::NameKanaHankaku => &self.name_kana_hankaku,
            KycField::NameKanaZenkaku => &self.name_kana_zenkaku,
            KycField::MiddleNames => &self.middle_names,
            KycField::FamilyNameAtBirth => &self.family_name_at_birth,
            KycField::Address => &self.address,
            KycField::StreetName => &self.street_name,
            KycField::StreetNumber => &self.street_number,
            KycField::PostalCode => &self.postal_code,
            KycField::Region => &self.region,
            KycField::Locality => &self.locality,
            KycField::Country => &self.country,
            KycField::HouseNumberExtension => &self.house_number_extension,
            KycField::Birthdate => &self.birthdate,
            KycField::Email => &self.email,
            KycField::Gender => return self.gender.map(Gender::as_str),
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// The fields that will be checked, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<KycField> {
        KycField::ALL.into_iter().filter(|f| self.value(*f).is_some()).collect()
    }
}

impl Verification for KycMatchRequest {
    type Response = KycMatchResponse;

    const CAPABILITY: Capability = Capability::KycMatch;
}

/// Gender values accepted by the KYC match endpoint.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
}

impl Gender {
    /// The wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

/// A KYC attribute that can be matched.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum KycField {
    /// Identity document number.
    IdDocument,
    /// Complete name.
    Name,
    /// First name(s).
    GivenName,
    /// Last name(s).
    FamilyName,
    /// Name in Hankaku-Kana.
    NameKanaHankaku,
    /// Name in Zenkaku-Kana.
    NameKanaZenkaku,
    /// Middle name(s).
    MiddleNames,
    /// Last name at birth.
    FamilyNameAtBirth,
    /// Complete address.
    Address,
    /// Street name.
    StreetName,
    /// Street number.
    StreetNumber,
    /// Postal code.
    PostalCode,
    /// Region.
    Region,
    /// Locality.
    Locality,
    /// Country.
    Country,
    /// House number extension.
    HouseNumberExtension,
    /// Date of birth.
    Birthdate,
    /// Email address.
    Email,
    /// Gender.
    Gender,
}

impl KycField {
    /// Every matchable field.
    pub const ALL: [Self; 19] = [
        Self::IdDocument,
        Self::Name,
        Self::GivenName,
        Self::FamilyName,
        Self::NameKanaHankaku,
        Self::NameKanaZenkaku,
        Self::MiddleNames,
        Self::FamilyNameAtBirth,
        Self::Address,
        Self::StreetName,
        Self::StreetNumber,
        Self::PostalCode,
        Self::Region,
        Self::Locality,
        Self::Country,
        Self::HouseNumberExtension,
        Self::Birthdate,
        Self::Email,
        Self::Gender,
    ];

    /// The request field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdDocument => "idDocument",
            Self::Name => "name",
            Self::GivenName => "givenName",
            Self::FamilyName => "familyName",
            Self::NameKanaHankaku => "nameKanaHankaku",
            Self::NameKanaZenkaku => "nameKanaZenkaku",
            Self::MiddleNames => "middleNames",
            Self::FamilyNameAtBirth => "familyNameAtBirth",
            Self::Address => "address",
            Self::StreetName => "streetName",
            Self::StreetNumber => "streetNumber",
            Self::PostalCode => "postalCode",
            Self::Region => "region",
            Self::Locality => "locality",
            Self::Country => "country",
            Self::HouseNumberExtension => "houseNumberExtension",
            Self::Birthdate => "birthdate",
            Self::Email => "email",
            Self::Gender => "gender",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IdDocument => "ID Document",
            Self::Name => "Full Name",
            Self::GivenName => "First Name",
            Self::FamilyName => "Last Name",
            Self::NameKanaHankaku => "Name (Hankaku-Kana)",
            Self::NameKanaZenkaku => "Name (Zenkaku-Kana)",
            Self::MiddleNames => "Middle Names",
            Self::FamilyNameAtBirth => "Last Name at Birth",
            Self::Address => "Address",
            Self::StreetName => "Street Name",
            Self::StreetNumber => "Street Number",
            Self::PostalCode => "Postal Code",
            Self::Region => "Region",
            Self::Locality => "Locality",
            Self::Country => "Country",
            Self::HouseNumberExtension => "House Number Extension",
            Self::Birthdate => "Birth Date",
            Self::Email => "Email",
            Self::Gender => "Gender",
        }
    }
}

impl Display for KycField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// KYC match result: a [`MatchResult`] per requested field and, for
/// free-text fields, a 0-100 similarity score when the field did not match
/// exactly.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct KycMatchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_kana_hankaku_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_kana_hankaku_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_kana_zenkaku_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_kana_zenkaku_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_names_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_names_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name_at_birth_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name_at_birth_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number_extension_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_match: Option<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_match: Option<MatchResult>,

    /// Note added by the sandbox environment.
    #[serde(rename = "_sandbox", skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

impl KycMatchResponse {
    /// The match result reported for a field.
    #[must_use]
    pub const fn result(&self, field: KycField) -> Option<MatchResult> {
        match field {
            KycField::IdDocument => self.id_document_match,
            KycField::Name => self.name_match,
            KycField::GivenName => self.given_name_match,
            KycField::FamilyName => self.family_name_match,
            KycField::NameKanaHankaku => self.name_kana_hankaku_match,
            KycField::NameKanaZenkaku => self.name_kana_zenkaku_match,
            KycField::MiddleNames => self.middle_names_match,
            KycField::FamilyNameAtBirth => self.family_name_at_birth_match,
            KycField::Address => self.address_match,
            KycField::StreetName => self.street_name_match,
            KycField::StreetNumber => self.street_number_match,
            KycField::PostalCode => self.postal_code_match,
            KycField::Region => self.region_match,
            KycField::Locality => self.locality_match,
            KycField::Country => self.country_match,
            KycField::HouseNumberExtension => self.house_number_extension_match,
            KycField::Birthdate => self.birthdate_match,
            KycField::Email => self.email_match,
            KycField::Gender => self.gender_match,
        }
    }

    /// The similarity score reported for a field. Only free-text fields
    /// carry a score.
    #[must_use]
    pub const fn score(&self, field: KycField) -> Option<u8> {
        match field {
            KycField::Name => self.name_match_score,
            KycField::GivenName => self.given_name_match_score,
            KycField::FamilyName => self.family_name_match_score,
            KycField::NameKanaHankaku => self.name_kana_hankaku_match_score,
            KycField::NameKanaZenkaku => self.name_kana_zenkaku_match_score,
            KycField::MiddleNames => self.middle_names_score,
            KycField::FamilyNameAtBirth => self.family_name_at_birth_match_score,
            KycField::Address => self.address_match_score,
            KycField::StreetName => self.street_name_match_score,
            KycField::StreetNumber => self.street_number_match_score,
            KycField::Region => self.region_match_score,
            KycField::Locality => self.locality_match_score,
            KycField::Email => self.email_match_score,
            KycField::IdDocument
            | KycField::PostalCode
            | KycField::Country
            | KycField::HouseNumberExtension
            | KycField::Birthdate
            | KycField::Gender => None,
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    // Empty and absent fields should not be sent.
    #[test]
    fn skip_blank() {
        let request = KycMatchRequest {
            given_name: Some("Federica".to_string()),
            family_name: Some(String::new()),
            email: Some("  ".to_string()),
            gender: Some(Gender::Female),
            ..KycMatchRequest::default()
        };

        let ser = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(ser, json!({"givenName": "Federica", "gender": "FEMALE"}));
        assert_eq!(request.fields(), vec![KycField::GivenName, KycField::Gender]);
    }

    #[test]
    fn empty_gender() {
        let request: KycMatchRequest =
            serde_json::from_value(json!({"idDocument": "66666666q", "gender": ""}))
                .expect("should deserialize");
        assert_eq!(request.gender, None);
        assert_eq!(request.fields(), vec![KycField::IdDocument]);
    }

    #[test]
    fn response_scores() {
        let response: KycMatchResponse = serde_json::from_value(json!({
            "idDocumentMatch": "true",
            "nameMatch": "false",
            "nameMatchScore": 87,
            "middleNamesMatch": "false",
            "middleNamesScore": 40,
            "emailMatch": "not_available",
            "_sandbox": "simulated"
        }))
        .expect("should deserialize");

        assert_eq!(response.result(KycField::IdDocument), Some(MatchResult::True));
        assert_eq!(response.score(KycField::Name), Some(87));
        assert_eq!(response.score(KycField::MiddleNames), Some(40));
        assert_eq!(response.result(KycField::Email), Some(MatchResult::NotAvailable));
        assert_eq!(response.result(KycField::Gender), None);
        assert_eq!(response.sandbox.as_deref(), Some("simulated"));
    }
}
