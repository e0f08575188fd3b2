use std::path::PathBuf;

use hygiene_core::model::DifficultyFilter;
use storage::json::{load_question_bank, load_tips};

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .join(name)
}

#[test]
fn bundled_question_bank_loads() {
    let bank = load_question_bank(data_file("questions.json")).expect("load bank");
    let names: Vec<_> = bank.category_names().collect();
    assert_eq!(names[0], "Phishing");
    assert_eq!(names.len(), 5);

    let phishing = bank.category("Phishing").expect("phishing");
    assert!(phishing.len() > 10);
    assert_eq!(phishing.difficulties(), ["Easy", "Medium", "Hard"]);
    assert!(
        phishing
            .filtered(&DifficultyFilter::Only("Hard".into()))
            .all(|q| q.difficulty() == "Hard")
    );
    assert_eq!(
        bank.description("Malware"),
        Some("Avoid malicious software and keep devices patched.")
    );
}

#[test]
fn bundled_tips_load() {
    let tips = load_tips(data_file("tips.json")).expect("load tips");
    assert_eq!(tips.len(), 4);
    assert!(tips.iter().all(|group| !group.is_empty()));
    assert_eq!(tips[0].category, "Password Security");
}
