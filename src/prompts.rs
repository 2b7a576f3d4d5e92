//! The analysis prompt sent with the report images.
//!
//! The tag template at the end of the prompt is a contract: the parser in
//! [`crate::pipeline::parse`] only understands `<h3>`, `<p>`, `<ul>`/`<li>`
//! and `<strong>`. Changing the template means changing the parser too.

use crate::record::PatientIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of checkup selected by the patient. Picks which vitals are quoted
/// in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckupType {
    #[default]
    GeneralCheckup,
    DengueFever,
    Malaria,
    Typhoid,
    /// Any other label; no checkup-specific vitals.
    Other(String),
}

impl CheckupType {
    /// Parse the display label; unknown labels become [`CheckupType::Other`]
    /// and a blank label means the default.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | "General Checkup" => CheckupType::GeneralCheckup,
            "Dengue Fever" => CheckupType::DengueFever,
            "Malaria" => CheckupType::Malaria,
            "Typhoid" => CheckupType::Typhoid,
            other => CheckupType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CheckupType::GeneralCheckup => "General Checkup",
            CheckupType::DengueFever => "Dengue Fever",
            CheckupType::Malaria => "Malaria",
            CheckupType::Typhoid => "Typhoid",
            CheckupType::Other(label) => label,
        }
    }

    /// Vital keys this checkup quotes in the prompt.
    pub fn vital_keys(&self) -> &'static [&'static str] {
        match self {
            CheckupType::GeneralCheckup => &["bp", "sugar", "thyroid", "temp", "heart_rate"],
            CheckupType::DengueFever => &["fever_days", "platelets", "pain_level"],
            CheckupType::Malaria => &["shivering", "fever_pattern", "travel_hist"],
            CheckupType::Typhoid => &["stomach_pain", "appetite"],
            CheckupType::Other(_) => &[],
        }
    }
}

impl fmt::Display for CheckupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the prompt is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub patient: PatientIdentity,
    pub checkup: CheckupType,
    /// Checkup-specific readings keyed by [`CheckupType::vital_keys`].
    #[serde(default)]
    pub vitals: BTreeMap<String, String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub diet: String,
    /// Output language code. Default: `en`.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

const NA: &str = "N/A";

impl AnalysisRequest {
    pub fn new(patient: PatientIdentity, checkup: CheckupType) -> Self {
        Self {
            patient,
            checkup,
            vitals: BTreeMap::new(),
            height: None,
            weight: None,
            symptoms: String::new(),
            diet: String::new(),
            language: default_language(),
        }
    }

    pub fn vital(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vitals.insert(key.into(), value.into());
        self
    }

    fn v(&self, key: &str) -> &str {
        self.vitals
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NA)
    }

    /// One-line summary of the checkup-specific vitals.
    pub fn specific_notes(&self) -> String {
        match self.checkup {
            CheckupType::GeneralCheckup => format!(
                "BP: {}, Sugar: {}, Thyroid: {}, Body Temp: {} F, Heart Rate: {} bpm.",
                self.v("bp"),
                self.v("sugar"),
                self.v("thyroid"),
                self.v("temp"),
                self.v("heart_rate")
            ),
            CheckupType::DengueFever => format!(
                "Fever: {} days. Platelets: {}. Body Pain: {}.",
                self.v("fever_days"),
                self.v("platelets"),
                self.v("pain_level")
            ),
            CheckupType::Malaria => format!(
                "Shivering: {}. Pattern: {}. Travel: {}.",
                self.v("shivering"),
                self.v("fever_pattern"),
                self.v("travel_hist")
            ),
            CheckupType::Typhoid => format!(
                "Stomach Pain: {}. Appetite: {}.",
                self.v("stomach_pain"),
                self.v("appetite")
            ),
            CheckupType::Other(_) => String::new(),
        }
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or(NA)
}

/// Build the full analysis prompt for `req`.
pub fn build_analysis_prompt(req: &AnalysisRequest) -> String {
    let age = req
        .patient
        .age
        .map_or_else(|| NA.to_string(), |a| a.to_string());
    let language = if req.language.trim().is_empty() {
        "en"
    } else {
        req.language.trim()
    };

    format!(
        r#"Act as a highly experienced Senior General Physician (MD), Radiologist, and Nutritionist.
Analyze the uploaded medical images (X-rays, blood reports, visible symptoms, etc.) combined with patient data.

LANGUAGE MODE: Output exactly in language code: '{language}'.
PATIENT: {name}, {age}yrs, {gender}.
VITALS: {notes}. Height:{height}, Weight:{weight}.
SYMPTOMS: {symptoms}.
DIET TYPE: {diet}.

TASK:
1. READ VALUES: Extract numbers, ranges, and visual anomalies from the images meticulously.
2. ANALYZE: Correlate vitals, image findings, and symptoms to form a hypothesis.
3. ADVISE: Provide Indian-context medical advice, medicines (Safe OTC), and specific diet changes.

FORMAT YOUR RESPONSE STRICTLY USING THE FOLLOWING HTML TAGS ONLY (Do not use Markdown like ** or ##).
The PDF generator depends on these specific tags to function.

<h3>1. DETAILED CLINICAL OBSERVATION</h3>
<p>Describe exactly what is visible in the images and abnormal in vitals.</p>
<ul>
  <li>Point 1: Detailed observation from image/data.</li>
  <li>Point 2: Correlation with reported symptoms.</li>
</ul>

<h3>2. MEDICAL DIAGNOSIS & EXPLANATION</h3>
<p>Explain the potential condition clearly. Be reassuring but realistic.</p>

<h3>3. TREATMENT & MEDICATION (INDIAN CONTEXT)</h3>
<p>Step-by-step path to recovery.</p>
<ul>
   <li><strong>Medicines:</strong> Suggest OTC options (like Dolo-650, Cetrizine, ORS, etc.) with dosage hints if safe.</li>
   <li><strong>Home Remedy:</strong> Effective Indian household remedies.</li>
   <li><strong>Alert:</strong> When to see a doctor immediately.</li>
</ul>

<h3>4. PRECISE DIET PLAN ({diet})</h3>
<p>Foods to eat and foods to strictly avoid for this specific condition.</p>
<ul>
   <li><strong>Eat:</strong> Specific ingredients tailored to the disease (e.g. Papaya leaf for Dengue).</li>
   <li><strong>Avoid:</strong> Specific triggers.</li>
</ul>
"#,
        name = req.patient.name,
        gender = or_na(req.patient.gender.as_deref()),
        notes = req.specific_notes(),
        height = or_na(req.height.as_deref()),
        weight = or_na(req.weight.as_deref()),
        symptoms = req.symptoms,
        diet = req.diet,
    )
}
