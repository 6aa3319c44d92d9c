//! Table statistics and ordering over measured subframes.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::stats;

use super::data::MeasureItem;
use super::units::MeasureUnits;

/// A sortable column of the measurement table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortingProperty {
    #[default]
    Index,
    Weight,
    Fwhm,
    Eccentricity,
    SnrWeight,
    Median,
    MedianMeanDev,
    Noise,
    NoiseRatio,
    Stars,
    StarResidual,
    FwhmMeanDev,
    EccentricityMeanDev,
    StarResidualMeanDev,
}

impl SortingProperty {
    pub const ALL: [SortingProperty; 14] = [
        SortingProperty::Index,
        SortingProperty::Weight,
        SortingProperty::Fwhm,
        SortingProperty::Eccentricity,
        SortingProperty::SnrWeight,
        SortingProperty::Median,
        SortingProperty::MedianMeanDev,
        SortingProperty::Noise,
        SortingProperty::NoiseRatio,
        SortingProperty::Stars,
        SortingProperty::StarResidual,
        SortingProperty::FwhmMeanDev,
        SortingProperty::EccentricityMeanDev,
        SortingProperty::StarResidualMeanDev,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortingProperty::Index => "index",
            SortingProperty::Weight => "weight",
            SortingProperty::Fwhm => "fwhm",
            SortingProperty::Eccentricity => "eccentricity",
            SortingProperty::SnrWeight => "snr_weight",
            SortingProperty::Median => "median",
            SortingProperty::MedianMeanDev => "median_mean_dev",
            SortingProperty::Noise => "noise",
            SortingProperty::NoiseRatio => "noise_ratio",
            SortingProperty::Stars => "stars",
            SortingProperty::StarResidual => "star_residual",
            SortingProperty::FwhmMeanDev => "fwhm_mean_dev",
            SortingProperty::EccentricityMeanDev => "eccentricity_mean_dev",
            SortingProperty::StarResidualMeanDev => "star_residual_mean_dev",
        }
    }

    /// Value of this property for `item`, converted to the configured units.
    pub fn value(self, item: &MeasureItem, units: &MeasureUnits) -> f64 {
        let d = &item.data;
        match self {
            SortingProperty::Index => item.index as f64,
            SortingProperty::Weight => item.weight,
            SortingProperty::Fwhm => units.fwhm(d.fwhm),
            SortingProperty::Eccentricity => d.eccentricity,
            SortingProperty::SnrWeight => d.snr_weight,
            SortingProperty::Median => units.range(d.median),
            SortingProperty::MedianMeanDev => units.range(d.median_mean_dev),
            SortingProperty::Noise => units.range(d.noise),
            SortingProperty::NoiseRatio => d.noise_ratio,
            SortingProperty::Stars => d.star_count as f64,
            SortingProperty::StarResidual => d.star_residual,
            SortingProperty::FwhmMeanDev => units.fwhm(d.fwhm_mean_dev),
            SortingProperty::EccentricityMeanDev => d.eccentricity_mean_dev,
            SortingProperty::StarResidualMeanDev => d.star_residual_mean_dev,
        }
    }
}

impl fmt::Display for SortingProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortingProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_ascii_lowercase().replace('-', "_");
        SortingProperty::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| format!("unknown sorting property '{s}'"))
    }
}

/// Sort `items` by `property`. Ties keep their input order.
pub fn sort_items(
    items: &mut [MeasureItem],
    property: SortingProperty,
    ascending: bool,
    units: &MeasureUnits,
) {
    items.sort_by(|a, b| {
        let ord = property
            .value(a, units)
            .partial_cmp(&property.value(b, units))
            .unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

/// Distance of `value` from `median` in units of `deviation`.
/// A zero deviation counts as 1.
pub fn deviation_normalize(value: f64, median: f64, deviation: f64) -> f64 {
    let deviation = if deviation != 0.0 { deviation } else { 1.0 };
    (value - median) / deviation
}

/// Summary statistics of one property across a table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MeasureProperty {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Mean absolute deviation about the median.
    pub deviation: f64,
}

impl MeasureProperty {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mut sorted = values.to_vec();
        let median = stats::median(&mut sorted);
        Self {
            min,
            max,
            median,
            deviation: stats::avg_dev(values, median),
        }
    }

    /// [`deviation_normalize`] against this property.
    pub fn sigma(&self, value: f64) -> f64 {
        deviation_normalize(value, self.median, self.deviation)
    }
}

/// Per-property statistics of a measurement table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MeasureProperties {
    pub weight: MeasureProperty,
    pub fwhm: MeasureProperty,
    pub eccentricity: MeasureProperty,
    pub snr_weight: MeasureProperty,
    pub median: MeasureProperty,
    pub median_mean_dev: MeasureProperty,
    pub noise: MeasureProperty,
    pub noise_ratio: MeasureProperty,
    pub stars: MeasureProperty,
    pub star_residual: MeasureProperty,
    pub fwhm_mean_dev: MeasureProperty,
    pub eccentricity_mean_dev: MeasureProperty,
    pub star_residual_mean_dev: MeasureProperty,
}

impl MeasureProperties {
    pub fn compute(items: &[MeasureItem], units: &MeasureUnits) -> Self {
        let of = |property: SortingProperty| {
            let values: Vec<f64> = items.iter().map(|item| property.value(item, units)).collect();
            MeasureProperty::from_values(&values)
        };

        Self {
            weight: of(SortingProperty::Weight),
            fwhm: of(SortingProperty::Fwhm),
            eccentricity: of(SortingProperty::Eccentricity),
            snr_weight: of(SortingProperty::SnrWeight),
            median: of(SortingProperty::Median),
            median_mean_dev: of(SortingProperty::MedianMeanDev),
            noise: of(SortingProperty::Noise),
            noise_ratio: of(SortingProperty::NoiseRatio),
            stars: of(SortingProperty::Stars),
            star_residual: of(SortingProperty::StarResidual),
            fwhm_mean_dev: of(SortingProperty::FwhmMeanDev),
            eccentricity_mean_dev: of(SortingProperty::EccentricityMeanDev),
            star_residual_mean_dev: of(SortingProperty::StarResidualMeanDev),
        }
    }

    /// Statistics for a sortable property; `None` for the index.
    pub fn get(&self, property: SortingProperty) -> Option<&MeasureProperty> {
        Some(match property {
            SortingProperty::Index => return None,
            SortingProperty::Weight => &self.weight,
            SortingProperty::Fwhm => &self.fwhm,
            SortingProperty::Eccentricity => &self.eccentricity,
            SortingProperty::SnrWeight => &self.snr_weight,
            SortingProperty::Median => &self.median,
            SortingProperty::MedianMeanDev => &self.median_mean_dev,
            SortingProperty::Noise => &self.noise,
            SortingProperty::NoiseRatio => &self.noise_ratio,
            SortingProperty::Stars => &self.stars,
            SortingProperty::StarResidual => &self.star_residual,
            SortingProperty::FwhmMeanDev => &self.fwhm_mean_dev,
            SortingProperty::EccentricityMeanDev => &self.eccentricity_mean_dev,
            SortingProperty::StarResidualMeanDev => &self.star_residual_mean_dev,
        })
    }
}
