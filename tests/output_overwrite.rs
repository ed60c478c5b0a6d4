mod common;

use bookforge::output::overwrite_allowed;

use common::FakeInteraction;

#[tokio::test]
async fn fresh_paths_are_written_without_asking() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![dir.path().join("book.txt"), dir.path().join("book.epub")];
    let mut interaction = FakeInteraction::new();

    assert!(overwrite_allowed(&paths, false, &mut interaction).await);
    assert!(interaction.asked.is_empty());
}

#[tokio::test]
async fn declining_keeps_the_existing_book() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("book.txt");
    std::fs::write(&existing, "an earlier book").unwrap();
    let paths = vec![existing.clone(), dir.path().join("book.epub")];
    let mut interaction = FakeInteraction::confirming([false]);

    assert!(!overwrite_allowed(&paths, false, &mut interaction).await);
    assert_eq!(interaction.asked, vec!["Output Exists"]);
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "an earlier book");
}

#[tokio::test]
async fn confirming_allows_the_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("book.epub");
    std::fs::write(&existing, "PK").unwrap();
    let mut interaction = FakeInteraction::confirming([true]);

    assert!(overwrite_allowed(&[existing], false, &mut interaction).await);
    assert_eq!(interaction.asked, vec!["Output Exists"]);
}

#[tokio::test]
async fn force_skips_the_question() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("book.txt");
    std::fs::write(&existing, "an earlier book").unwrap();
    let mut interaction = FakeInteraction::new();

    assert!(overwrite_allowed(&[existing], true, &mut interaction).await);
    assert!(interaction.asked.is_empty());
}
