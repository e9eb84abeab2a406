//! Admin list filters.
//!
//! Each admin list accepts a fixed set of typed filters. `GET .../filters` returns them as
//! [`ListFilter`]s so a client can draw the filter sidebar.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use utoipa::ToSchema;

/// The experience buckets offered on the admin cook list.
///
/// Bucket `n` selects cooks with `n - 5 ..= n - 1` years of experience, so `15` matches
/// 10 to 14 years and `20` matches 15 to 19.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ExperienceBucket {
    LessThanFive,
    FiveToTen,
    TenToFifteen,
    TwentyPlus,
}

impl ExperienceBucket {
    pub const ALL: [ExperienceBucket; 4] = [
        ExperienceBucket::LessThanFive,
        ExperienceBucket::FiveToTen,
        ExperienceBucket::TenToFifteen,
        ExperienceBucket::TwentyPlus,
    ];

    /// The query value selecting this bucket.
    pub fn years(self) -> i32 {
        match self {
            ExperienceBucket::LessThanFive => 5,
            ExperienceBucket::FiveToTen => 10,
            ExperienceBucket::TenToFifteen => 15,
            ExperienceBucket::TwentyPlus => 20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceBucket::LessThanFive => "less than 5 years",
            ExperienceBucket::FiveToTen => "5-10 years",
            ExperienceBucket::TenToFifteen => "10-15 years",
            ExperienceBucket::TwentyPlus => "20+ years",
        }
    }

    pub fn range(self) -> RangeInclusive<i32> {
        let years = self.years();
        (years - 5)..=(years - 1)
    }

    /// Parse the `year` query value. Blank means no filter.
    pub fn from_param(raw: Option<&str>) -> Result<Option<Self>, String> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(raw) => raw,
        };
        Self::ALL
            .into_iter()
            .find(|bucket| raw.parse::<i32>().ok() == Some(bucket.years()))
            .map(Some)
            .ok_or_else(|| format!("Invalid experience filter: {raw}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterChoice {
    /// Value to send as the filter's query parameter
    pub value: String,
    pub label: String,
}

/// One filter of an admin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListFilter {
    pub title: String,
    /// Query parameter the filter is applied through
    pub parameter_name: String,
    pub choices: Vec<FilterChoice>,
}

impl ListFilter {
    pub fn experience() -> Self {
        Self {
            title: "experience".to_string(),
            parameter_name: "year".to_string(),
            choices: ExperienceBucket::ALL
                .into_iter()
                .map(|bucket| FilterChoice {
                    value: bucket.years().to_string(),
                    label: bucket.label().to_string(),
                })
                .collect(),
        }
    }

    pub fn dish_type(dish_types: impl IntoIterator<Item = (i64, String)>) -> Self {
        Self {
            title: "dish type".to_string(),
            parameter_name: "type".to_string(),
            choices: dish_types
                .into_iter()
                .map(|(id, name)| FilterChoice {
                    value: id.to_string(),
                    label: name,
                })
                .collect(),
        }
    }
}
