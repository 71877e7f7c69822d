//! Display labels for catalog identifiers.
//!
//! Lookups fail open: an identifier missing from the table is returned as-is,
//! so new catalog categories render before the table catches up.

const CATEGORY_LABELS: &[(&str, &str)] = &[
    ("payroll", "Payroll & Compliance"),
    ("attendance", "Attendance & Leave"),
    ("hrms", "Core HRMS"),
    ("ats", "Recruitment (ATS)"),
    ("performance", "Performance Management"),
    ("engagement", "Employee Engagement"),
    ("lms", "Learning & Development"),
    ("expense", "Expense Management"),
];

const SIZE_BAND_LABELS: &[(&str, &str)] = &[("SMALL", "1–50"), ("MID", "51–200"), ("LARGE", "201+")];

fn lookup<'a>(table: &'static [(&'static str, &'static str)], id: &'a str) -> &'a str {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map_or(id, |(_, label)| *label)
}

pub fn category_label(id: &str) -> &str {
    lookup(CATEGORY_LABELS, id)
}

pub fn size_band_label(id: &str) -> &str {
    lookup(SIZE_BAND_LABELS, id)
}
