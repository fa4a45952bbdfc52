//! Physician classification over NUCC taxonomy codes.
//!
//! NPPES records carry one or more taxonomy codes. Codes are stable where the
//! free-text descriptions drift, so classification works on the code sets
//! alone: a record is a physician iff none of its codes is on the
//! non-physician deny list and at least one is on the physician allow list.
//! Deny wins, because registry entries occasionally carry multiple roles and
//! an ambiguous multi-role entry should not surface in a "find a physician"
//! result.

/// Allopathic & Osteopathic Physicians (NUCC section 20) codes accepted as
/// physicians.
const PHYSICIAN_TAXONOMY_CODES: &[&str] = &[
    "207K00000X", // Allergy & Immunology
    "207L00000X", // Anesthesiology
    "207N00000X", // Dermatology
    "207P00000X", // Emergency Medicine
    "207Q00000X", // Family Medicine
    "207R00000X", // Internal Medicine
    "207RC0000X", // Cardiovascular Disease
    "207RC0001X", // Clinical Cardiac Electrophysiology
    "207RE0101X", // Endocrinology, Diabetes & Metabolism
    "207RG0100X", // Gastroenterology
    "207RG0300X", // Geriatric Medicine
    "207RH0000X", // Hematology
    "207RH0003X", // Hematology & Oncology
    "207RI0011X", // Interventional Cardiology
    "207RI0200X", // Infectious Disease
    "207RN0300X", // Nephrology
    "207RP1001X", // Pulmonary Disease
    "207RR0500X", // Rheumatology
    "207RX0202X", // Medical Oncology
    "207T00000X", // Neurological Surgery
    "207V00000X", // Obstetrics & Gynecology
    "207VE0102X", // Reproductive Endocrinology
    "207VX0201X", // Gynecologic Oncology
    "207W00000X", // Ophthalmology
    "207X00000X", // Orthopaedic Surgery
    "207Y00000X", // Otolaryngology
    "208000000X", // Pediatrics
    "2080P0207X", // Pediatric Hematology-Oncology
    "2084N0400X", // Neurology
    "2084P0800X", // Psychiatry
    "2084S0010X", // Sleep Medicine
    "2085R0001X", // Radiation Oncology
    "2085R0202X", // Diagnostic Radiology
    "208600000X", // Surgery
    "2086X0206X", // Surgical Oncology
    "208800000X", // Urology
    "208C00000X", // Colon & Rectal Surgery
    "208D00000X", // General Practice
    "208M00000X", // Hospitalist
    "208100000X", // Physical Medicine & Rehabilitation
];

/// Non-physician provider codes that exclude a record outright, even when a
/// physician code is also present.
const NON_PHYSICIAN_TAXONOMY_CODES: &[&str] = &[
    "363L00000X", // Nurse Practitioner
    "363LA2200X", // Nurse Practitioner, Adult Health
    "363LF0000X", // Nurse Practitioner, Family
    "363LP0200X", // Nurse Practitioner, Pediatrics
    "363LX0001X", // Nurse Practitioner, Obstetrics & Gynecology
    "363A00000X", // Physician Assistant
    "363AM0700X", // Physician Assistant, Medical
    "363AS0400X", // Physician Assistant, Surgical
    "364S00000X", // Clinical Nurse Specialist
    "367500000X", // Certified Registered Nurse Anesthetist
    "367A00000X", // Advanced Practice Midwife
    "176B00000X", // Midwife
    "163W00000X", // Registered Nurse
    "225100000X", // Physical Therapist
    "225X00000X", // Occupational Therapist
    "235Z00000X", // Speech-Language Pathologist
    "103T00000X", // Psychologist
    "103TC0700X", // Psychologist, Clinical
    "1041C0700X", // Clinical Social Worker
    "183500000X", // Pharmacist
    "111N00000X", // Chiropractor
    "122300000X", // Dentist
    "1223G0001X", // General Dentist
    "152W00000X", // Optometrist
    "213E00000X", // Podiatrist
    "133V00000X", // Dietitian, Registered
];

/// Classify a record's taxonomy code set. Deny-list membership wins over
/// allow-list membership; a record with no recognized physician code is
/// rejected.
pub fn is_physician<'a>(codes: impl IntoIterator<Item = &'a str>) -> bool {
    let mut any_physician = false;
    for code in codes {
        if NON_PHYSICIAN_TAXONOMY_CODES.contains(&code) {
            return false;
        }
        if PHYSICIAN_TAXONOMY_CODES.contains(&code) {
            any_physician = true;
        }
    }
    any_physician
}

#[cfg(test)]
mod tests {
    use super::is_physician;

    #[test]
    fn physician_codes_pass() {
        assert!(is_physician(["207R00000X"]));
        assert!(is_physician(["207RX0202X", "208000000X"]));
    }

    #[test]
    fn non_physician_codes_fail() {
        assert!(!is_physician(["363L00000X"]));
        assert!(!is_physician(["225100000X"]));
    }

    #[test]
    fn deny_wins_over_allow() {
        // A multi-role record carrying both an MD specialty and a nurse
        // practitioner code must be excluded.
        assert!(!is_physician(["207R00000X", "363L00000X"]));
        assert!(!is_physician(["363LF0000X", "207RX0202X"]));
    }

    #[test]
    fn unknown_or_empty_code_sets_fail() {
        assert!(!is_physician([]));
        assert!(!is_physician(["999X99999X"]));
    }
}
