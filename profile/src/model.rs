use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snoutid_matcher::{Candidate, Embedding};
use uuid::Uuid;

/// Store-assigned profile identifier. Ids increase with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dog:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DogType {
    #[default]
    Pet,
    Street,
    Adopted,
}

impl DogType {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Pet => "Pet",
            Self::Street => "Street Dog",
            Self::Adopted => "Adopted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DogGender {
    Male,
    Female,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DogColor {
    #[default]
    None,
    Black,
    White,
    Brown,
    Golden,
    Cream,
    Grey,
    Red,
}

impl DogColor {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Black => "Black",
            Self::White => "White",
            Self::Brown => "Brown",
            Self::Golden => "Golden",
            Self::Cream => "Cream",
            Self::Grey => "Grey",
            Self::Red => "Red",
        }
    }
}

/// One vaccination entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub date: NaiveDate,
    pub id: Uuid,
}

impl VaccinationRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            id: Uuid::new_v4(),
        }
    }
}

/// Descriptive, non-biometric data about a dog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DogDetails {
    pub name: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub gender: DogGender,
    #[serde(default)]
    pub primary_color: DogColor,
    #[serde(default)]
    pub secondary_color: DogColor,
    #[serde(default)]
    pub age_months: u32,
    #[serde(default)]
    pub dog_type: DogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption_date: Option<NaiveDate>,
    /// Newest first.
    #[serde(default)]
    pub vaccinations: Vec<VaccinationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microchip_number: Option<String>,
}

impl DogDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = breed.into();
        self
    }

    /// Records a vaccination, keeping the list sorted newest first.
    pub fn add_vaccination(&mut self, date: NaiveDate) -> &VaccinationRecord {
        let record = VaccinationRecord::new(date);
        let pos = self
            .vaccinations
            .iter()
            .position(|v| v.date < date)
            .unwrap_or(self.vaccinations.len());
        self.vaccinations.insert(pos, record);
        &self.vaccinations[pos]
    }

    /// Removes a vaccination by id. Returns false if it was not present.
    pub fn remove_vaccination(&mut self, id: Uuid) -> bool {
        let before = self.vaccinations.len();
        self.vaccinations.retain(|v| v.id != id);
        self.vaccinations.len() != before
    }
}

/// A dog record: optional nose embedding plus descriptive details.
///
/// The embedding is absent when extraction failed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogProfile {
    pub embedding: Option<Embedding>,
    pub details: DogDetails,
}

impl DogProfile {
    pub fn new(details: DogDetails, embedding: Option<Embedding>) -> Self {
        Self { embedding, details }
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// A profile as listed by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub id: ProfileId,
    pub profile: DogProfile,
}

impl Candidate for StoredProfile {
    type Id = ProfileId;

    fn candidate_id(&self) -> ProfileId {
        self.id
    }

    fn embedding(&self) -> Option<&Embedding> {
        self.profile.embedding.as_ref()
    }
}
