use std::path::Path;

const SECTION_FILES: [&str; 2] = ["catalogs/general.json", "catalogs/cardiology.json"];

const SEVERITIES: [&str; 4] = ["low", "moderate", "high", "critical"];

fn main() {
    for path in SECTION_FILES {
        validate_section_file(Path::new(path));
    }
    set_build_dependencies();
}

fn validate_section_file(section_path: &Path) {
    // Ensure section exists at build time
    assert!(
        section_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog section before building.\n",
        section_path.display()
    );

    let contents = std::fs::read_to_string(section_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            section_path.display()
        );
    });

    let section: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            section_path.display()
        );
    });

    validate_section_structure(&section, section_path);
}

fn validate_section_structure(section: &serde_json::Value, path: &Path) {
    assert!(
        section.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Path: {}\n",
        path.display()
    );

    assert!(
        section.get("section").and_then(|v| v.as_str()).is_some(),
        "\n\nCATALOG BUILD ERROR: Missing 'section' name\n\
         Path: {}\n",
        path.display()
    );

    let diseases = records(section, "diseases", path);
    let symptoms = records(section, "symptoms", path);

    for (i, record) in diseases.iter().enumerate() {
        validate_record(record, "disease", "related_symptoms", i);
    }
    for (i, record) in symptoms.iter().enumerate() {
        validate_record(record, "symptom", "related_diseases", i);
    }

    println!(
        "cargo:warning=Validated catalog section {}: {} diseases, {} symptoms",
        path.display(),
        diseases.len(),
        symptoms.len()
    );
}

fn records<'a>(section: &'a serde_json::Value, field: &str, path: &Path) -> &'a [serde_json::Value] {
    section
        .get(field)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_else(|| {
            panic!(
                "\n\nCATALOG BUILD ERROR: '{field}' must be an array\n\
                 Path: {}\n",
                path.display()
            );
        })
}

fn validate_record(record: &serde_json::Value, kind: &str, related_field: &str, index: usize) {
    let id = record
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("<unknown>");

    assert!(
        record.get("id").and_then(|v| v.as_str()).is_some_and(|s| !s.trim().is_empty()),
        "\n\nCATALOG BUILD ERROR: {kind} at index {index} missing 'id' field\n"
    );

    let severity = record.get("severity").and_then(|v| v.as_str());
    assert!(
        severity.is_some_and(|s| SEVERITIES.contains(&s.trim().to_lowercase().as_str())),
        "\n\nCATALOG BUILD ERROR: {kind} '{id}' (index {index}) has missing or unknown 'severity'\n\
         Expected one of: {}\n",
        SEVERITIES.join(", ")
    );

    assert!(
        record.get("category").and_then(|v| v.as_str()).is_some(),
        "\n\nCATALOG BUILD ERROR: {kind} '{id}' (index {index}) missing 'category' field\n"
    );

    assert!(
        record
            .get(related_field)
            .map_or(true, serde_json::Value::is_array),
        "\n\nCATALOG BUILD ERROR: {kind} '{id}' (index {index}) '{related_field}' must be an array\n"
    );
}

fn set_build_dependencies() {
    // Tell cargo to rerun if a section changes
    for path in SECTION_FILES {
        println!("cargo:rerun-if-changed={path}");
    }

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
