/// Model Definitions
///
/// Age groups, variants and vaccination status of the COVID model, the
/// labels the simulator uses for them in outcome names, and the time
/// constants shared by settings and figures.
use crate::cv_interface::{Week, WEEKS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Years of simulation since March 1, 2020
pub const SIM_DURATION: f64 = 2.25;
/// Years of data used for calibration
pub const CALIB_PERIOD: f64 = 1.5;
/// Years over which feasible ranges are checked
pub const FEASIBILITY_PERIOD: f64 = 1.5;

// ============================================================================
// Age Groups
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    Age0To4,
    Age5To12,
    Age13To17,
    Age18To29,
    Age30To49,
    Age50To64,
    Age65To79,
    Age80Plus,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 8] = [
        AgeGroup::Age0To4,
        AgeGroup::Age5To12,
        AgeGroup::Age13To17,
        AgeGroup::Age18To29,
        AgeGroup::Age30To49,
        AgeGroup::Age50To64,
        AgeGroup::Age65To79,
        AgeGroup::Age80Plus,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<AgeGroup> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Age0To4 => "0-4",
            AgeGroup::Age5To12 => "5-12",
            AgeGroup::Age13To17 => "13-17",
            AgeGroup::Age18To29 => "18-29",
            AgeGroup::Age30To49 => "30-49",
            AgeGroup::Age50To64 => "50-64",
            AgeGroup::Age65To79 => "65-79",
            AgeGroup::Age80Plus => "80+",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Variants and Vaccination Status
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Original,
    Delta,
    Novel,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::Delta, Variant::Novel];

    pub fn label(&self) -> &'static str {
        match self {
            Variant::Original => "Original",
            Variant::Delta => "Delta",
            Variant::Novel => "Novel",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VaccStatus {
    Unvaccinated,
    Vaccinated,
}

impl VaccStatus {
    pub const ALL: [VaccStatus; 2] = [VaccStatus::Unvaccinated, VaccStatus::Vaccinated];

    pub fn label(&self) -> &'static str {
        match self {
            VaccStatus::Unvaccinated => "Unvaccinated",
            VaccStatus::Vaccinated => "Vaccinated",
        }
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Names the (variant, vaccination status) profiles of the model.
///
/// Profiles are laid out variant-major: profile `p` of variant `v` and
/// vaccination status `vs` is `v * n_vacc_status + vs`.
#[derive(Debug, Clone)]
pub struct ProfileDefiner {
    pub n_age_groups: usize,
    pub n_variants: usize,
    pub n_vacc_status: usize,
    pub n_profiles: usize,

    pub str_age: Vec<String>,
    /// `str_profile[variant][vacc_status]`
    pub str_profile: Vec<Vec<String>>,
    /// `str_age_profile[age][variant][vacc_status]`
    pub str_age_profile: Vec<Vec<Vec<String>>>,
}

impl ProfileDefiner {
    pub fn new(n_age_groups: usize, n_variants: usize, n_vacc_status: usize) -> Self {
        let str_age: Vec<String> = (0..n_age_groups)
            .map(|a| match AgeGroup::from_index(a) {
                Some(age) => age.label().to_string(),
                None => format!("Age{}", a),
            })
            .collect();

        let str_profile: Vec<Vec<String>> = (0..n_variants)
            .map(|v| {
                (0..n_vacc_status)
                    .map(|vs| format!("{}-{}", variant_label(v), vacc_label(vs)))
                    .collect()
            })
            .collect();

        let str_age_profile = str_age
            .iter()
            .map(|age| {
                str_profile
                    .iter()
                    .map(|row| row.iter().map(|p| format!("{}-{}", age, p)).collect())
                    .collect()
            })
            .collect();

        Self {
            n_age_groups,
            n_variants,
            n_vacc_status,
            n_profiles: n_variants * n_vacc_status,
            str_age,
            str_profile,
            str_age_profile,
        }
    }

    /// Definer for the model's own age groups, variants and statuses
    pub fn covid() -> Self {
        Self::new(AgeGroup::COUNT, Variant::ALL.len(), VaccStatus::ALL.len())
    }

    pub fn get_profile_index(&self, variant: usize, vacc_status: usize) -> usize {
        variant * self.n_vacc_status + vacc_status
    }
}

fn variant_label(index: usize) -> String {
    Variant::ALL
        .get(index)
        .map(|v| v.label().to_string())
        .unwrap_or_else(|| format!("Variant{}", index))
}

fn vacc_label(index: usize) -> String {
    VaccStatus::ALL
        .get(index)
        .map(|v| v.label().to_string())
        .unwrap_or_else(|| format!("VaccStatus{}", index))
}

// ============================================================================
// Time
// ============================================================================

/// Number of whole weeks `w` with `w / 52 < years`
pub fn weeks_in_period(years: f64) -> usize {
    if !(years > 0.0) || !years.is_finite() {
        return 0;
    }
    // the product can land just above an integer; settle on the exact count
    let mut weeks = (years * WEEKS_PER_YEAR).ceil() as usize;
    while weeks > 0 && week_to_years(weeks - 1) >= years {
        weeks -= 1;
    }
    while week_to_years(weeks) < years {
        weeks += 1;
    }
    weeks
}

/// Simulation time (years) at the start of `week`
pub fn week_to_years(week: Week) -> f64 {
    week as f64 / WEEKS_PER_YEAR
}
