//! Condition-to-specialty resolution.
//!
//! Maps a free-text medical condition to an ordered list of taxonomy
//! description terms understood by the NPPES `taxonomy_description` filter.
//! The term order is a priority order: the registry query engine tries the
//! most specific service line first and falls back to broader ones.

pub type SpecialtyTerms = &'static [&'static str];

/// Keyword (lowercase) -> prioritized specialty terms.
///
/// Matching is substring-based against the lowercased condition; when several
/// keywords match, the longest keyword wins, ties broken by table order. That
/// is what lets "breast cancer" out-rank the bare "cancer" entry.
const CONDITION_SPECIALTIES: &[(&str, SpecialtyTerms)] = &[
    // Oncology
    ("breast cancer", &["Medical Oncology", "Hematology & Oncology", "Surgery"]),
    ("lung cancer", &["Medical Oncology", "Hematology & Oncology", "Pulmonary Disease"]),
    ("prostate cancer", &["Medical Oncology", "Urology"]),
    ("colorectal cancer", &["Medical Oncology", "Gastroenterology", "Colon & Rectal Surgery"]),
    ("colon cancer", &["Medical Oncology", "Gastroenterology", "Colon & Rectal Surgery"]),
    ("ovarian cancer", &["Gynecologic Oncology", "Medical Oncology"]),
    ("cervical cancer", &["Gynecologic Oncology", "Medical Oncology"]),
    ("pancreatic cancer", &["Medical Oncology", "Gastroenterology", "Surgery"]),
    ("skin cancer", &["Medical Oncology", "Dermatology"]),
    ("melanoma", &["Medical Oncology", "Dermatology"]),
    ("leukemia", &["Hematology & Oncology", "Hematology"]),
    ("lymphoma", &["Hematology & Oncology", "Hematology"]),
    ("myeloma", &["Hematology & Oncology", "Hematology"]),
    ("cancer", &["Medical Oncology", "Hematology & Oncology", "Radiation Oncology"]),
    ("carcinoma", &["Medical Oncology", "Hematology & Oncology", "Radiation Oncology"]),
    ("tumor", &["Medical Oncology", "Hematology & Oncology", "Radiation Oncology"]),
    ("oncology", &["Medical Oncology", "Hematology & Oncology", "Radiation Oncology"]),
    // Endocrine / metabolic
    ("type 1 diabetes", &["Endocrinology", "Internal Medicine"]),
    ("type 2 diabetes", &["Endocrinology", "Internal Medicine", "Family Medicine"]),
    ("diabetes", &["Endocrinology", "Internal Medicine", "Family Medicine"]),
    ("thyroid", &["Endocrinology", "Internal Medicine"]),
    ("obesity", &["Endocrinology", "Internal Medicine", "Family Medicine"]),
    ("osteoporosis", &["Endocrinology", "Rheumatology"]),
    // Cardiovascular
    ("heart failure", &["Cardiovascular Disease", "Internal Medicine"]),
    ("heart attack", &["Cardiovascular Disease", "Internal Medicine"]),
    ("myocardial infarction", &["Cardiovascular Disease", "Internal Medicine"]),
    ("atrial fibrillation", &["Cardiovascular Disease", "Clinical Cardiac Electrophysiology"]),
    ("arrhythmia", &["Cardiovascular Disease", "Clinical Cardiac Electrophysiology"]),
    ("coronary", &["Cardiovascular Disease", "Interventional Cardiology"]),
    ("high blood pressure", &["Cardiovascular Disease", "Internal Medicine", "Family Medicine"]),
    ("hypertension", &["Cardiovascular Disease", "Internal Medicine", "Family Medicine"]),
    ("cholesterol", &["Cardiovascular Disease", "Internal Medicine"]),
    ("heart", &["Cardiovascular Disease", "Internal Medicine"]),
    ("cardiac", &["Cardiovascular Disease", "Internal Medicine"]),
    // Respiratory
    ("asthma", &["Pulmonary Disease", "Allergy & Immunology"]),
    ("copd", &["Pulmonary Disease", "Internal Medicine"]),
    ("emphysema", &["Pulmonary Disease", "Internal Medicine"]),
    ("pulmonary fibrosis", &["Pulmonary Disease"]),
    ("cystic fibrosis", &["Pulmonary Disease", "Pediatrics"]),
    ("sleep apnea", &["Pulmonary Disease", "Sleep Medicine", "Otolaryngology"]),
    // Neurology / psychiatry
    ("alzheimer", &["Neurology", "Geriatric Medicine"]),
    ("dementia", &["Neurology", "Geriatric Medicine", "Psychiatry"]),
    ("parkinson", &["Neurology"]),
    ("multiple sclerosis", &["Neurology"]),
    ("epilepsy", &["Neurology"]),
    ("seizure", &["Neurology"]),
    ("stroke", &["Neurology", "Cardiovascular Disease"]),
    ("migraine", &["Neurology", "Internal Medicine"]),
    ("neuropathy", &["Neurology", "Internal Medicine"]),
    ("depression", &["Psychiatry", "Family Medicine"]),
    ("anxiety", &["Psychiatry", "Family Medicine"]),
    ("bipolar", &["Psychiatry"]),
    ("schizophrenia", &["Psychiatry"]),
    ("ptsd", &["Psychiatry"]),
    ("autism", &["Psychiatry", "Pediatrics", "Neurology"]),
    ("adhd", &["Psychiatry", "Pediatrics"]),
    // Rheumatology / musculoskeletal
    ("rheumatoid arthritis", &["Rheumatology", "Internal Medicine"]),
    ("osteoarthritis", &["Rheumatology", "Orthopaedic Surgery"]),
    ("arthritis", &["Rheumatology", "Internal Medicine", "Orthopaedic Surgery"]),
    ("lupus", &["Rheumatology", "Internal Medicine"]),
    ("fibromyalgia", &["Rheumatology", "Internal Medicine"]),
    ("back pain", &["Orthopaedic Surgery", "Physical Medicine & Rehabilitation"]),
    ("scoliosis", &["Orthopaedic Surgery"]),
    // Renal
    ("kidney", &["Nephrology", "Internal Medicine"]),
    ("renal", &["Nephrology", "Internal Medicine"]),
    // Gastroenterology / hepatology
    ("crohn", &["Gastroenterology", "Internal Medicine"]),
    ("ulcerative colitis", &["Gastroenterology", "Internal Medicine"]),
    ("irritable bowel", &["Gastroenterology", "Internal Medicine"]),
    ("celiac", &["Gastroenterology", "Internal Medicine"]),
    ("hepatitis", &["Gastroenterology", "Infectious Disease"]),
    ("cirrhosis", &["Gastroenterology", "Internal Medicine"]),
    ("liver", &["Gastroenterology", "Internal Medicine"]),
    // Infectious disease
    ("hiv", &["Infectious Disease", "Internal Medicine"]),
    ("aids", &["Infectious Disease", "Internal Medicine"]),
    ("covid", &["Infectious Disease", "Pulmonary Disease", "Internal Medicine"]),
    ("influenza", &["Infectious Disease", "Internal Medicine", "Family Medicine"]),
    ("tuberculosis", &["Infectious Disease", "Pulmonary Disease"]),
    // Hematology (non-malignant)
    ("sickle cell", &["Hematology", "Hematology & Oncology"]),
    ("anemia", &["Hematology", "Internal Medicine"]),
    ("hemophilia", &["Hematology"]),
    // Dermatology
    ("psoriasis", &["Dermatology", "Rheumatology"]),
    ("eczema", &["Dermatology", "Allergy & Immunology"]),
    ("acne", &["Dermatology"]),
    // Allergy
    ("allergy", &["Allergy & Immunology"]),
    ("allergies", &["Allergy & Immunology"]),
    // Women's health
    ("pregnancy", &["Obstetrics & Gynecology"]),
    ("fertility", &["Reproductive Endocrinology", "Obstetrics & Gynecology"]),
    ("endometriosis", &["Obstetrics & Gynecology"]),
    ("menopause", &["Obstetrics & Gynecology", "Endocrinology"]),
    // Eye / ENT
    ("glaucoma", &["Ophthalmology"]),
    ("cataract", &["Ophthalmology"]),
    ("macular degeneration", &["Ophthalmology"]),
    ("hearing loss", &["Otolaryngology"]),
    ("tinnitus", &["Otolaryngology"]),
    ("sinusitis", &["Otolaryngology", "Allergy & Immunology"]),
    // Urology
    ("prostate", &["Urology"]),
    ("incontinence", &["Urology", "Obstetrics & Gynecology"]),
    ("bladder", &["Urology"]),
];

/// Resolve a free-text condition to prioritized specialty filter terms.
///
/// Empty or missing input means "no specialty filter" and returns an empty
/// slice; so does a condition no table keyword matches.
pub fn resolve(condition: Option<&str>) -> SpecialtyTerms {
    let Some(condition) = condition else {
        return &[];
    };
    let needle = condition.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return &[];
    }

    let mut best: Option<(usize, SpecialtyTerms)> = None;
    for (keyword, terms) in CONDITION_SPECIALTIES {
        if !needle.contains(keyword) {
            continue;
        }
        // Strictly-longer wins; equal length keeps the earlier table entry.
        let better = match best {
            None => true,
            Some((len, _)) => keyword.len() > len,
        };
        if better {
            best = Some((keyword.len(), terms));
        }
    }
    best.map_or(&[], |(_, terms)| terms)
}
