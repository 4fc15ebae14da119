use hyflux_core::{GeneratorConfig, PresentationSpec};
use hyflux_pptx::{fixture, DeckReader, PptxGenerator, Validator};
use std::path::PathBuf;
use tempfile::TempDir;

const EVERY_KIND: &str = r#"
presentation:
  title: Every layout
  author: QA
slides:
  - type: title_white
    title: Opening
    subtitle: A tour
  - type: title_reverse
    title: Reverse
  - type: divider
    title: Part one
  - type: text_only
    title: Notes
    content: |
      Intro line
      - first
      - second
  - type: title_only
    title: Just a heading
  - type: text_content
    title: Text and media
    content:
      - image: diagram.png
        caption: The big picture
  - type: two_column
    title: Before and after
    left_content: Before
    right_content: After
  - type: three_column
    title: Options
    content:
      left: [A]
      middle: [B]
      right: [C]
  - type: quote
    quote: Simplicity is the ultimate sophistication
    attribution: Leonardo
  - type: end_slide
    contact: hello@hyflux.example
"#;

fn setup() -> (TempDir, PptxGenerator) {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("templates").join("HyFlux_Template_-.pptx");
    fixture::write_template(&template, 36).unwrap();
    let generator = PptxGenerator::new(template, GeneratorConfig::default());
    (dir, generator)
}

fn generate(dir: &TempDir, generator: &PptxGenerator, yaml: &str, name: &str) -> PathBuf {
    let spec = PresentationSpec::from_yaml(yaml).unwrap();
    let output = dir.path().join("output").join(name);
    generator.generate(&spec, &output).unwrap();
    output
}

#[test]
fn title_and_end_slide_use_first_and_last_layouts() {
    let (dir, generator) = setup();
    let yaml = "slides:\n  - type: title_white\n    title: Hi\n    subtitle: There\n  - type: end_slide\n";
    let output = generate(&dir, &generator, yaml, "two.pptx");

    let deck = DeckReader::open(&output).unwrap();
    assert_eq!(deck.slides.len(), 2);
    let layouts: Vec<_> = deck.slides.iter().map(|s| s.layout_index).collect();
    assert_eq!(layouts, vec![Some(0), Some(35)]);
    assert_eq!(deck.slides[1].text(), "Thank You");

    let report = Validator::default().validate(&output, Some(2)).unwrap();
    assert!(report.passed(), "{}", report);
}

#[test]
fn every_kind_generates_and_validates() {
    let (dir, generator) = setup();
    let output = generate(&dir, &generator, EVERY_KIND, "all.pptx");

    let deck = DeckReader::open(&output).unwrap();
    let layouts: Vec<_> = deck.slides.iter().filter_map(|s| s.layout_index).collect();
    assert_eq!(layouts, vec![0, 1, 6, 8, 12, 21, 23, 24, 34, 35]);

    let three_column = &deck.slides[7];
    let columns: Vec<String> = three_column.shapes[1..].iter().map(|s| s.text()).collect();
    assert_eq!(columns, vec!["A", "B", "C"]);
    assert!(deck.slides[5].text().contains("[Image: diagram.png]"));
    assert!(deck.slides[8].text().ends_with("\u{2014} Leonardo"));

    let report = Validator::default().validate(&output, Some(10)).unwrap();
    assert!(report.passed(), "{}", report);
    assert_eq!(report.get("slide_count").unwrap().detail, "10 slides");
}

#[test]
fn validating_twice_gives_identical_reports() {
    let (dir, generator) = setup();
    let output = generate(&dir, &generator, EVERY_KIND, "twice.pptx");
    let validator = Validator::default();
    let first = validator.validate(&output, None).unwrap();
    let second = validator.validate(&output, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_spec_generates_a_deck_that_fails_slide_count() {
    let (dir, generator) = setup();
    let output = generate(&dir, &generator, "slides: []", "empty.pptx");
    assert!(output.exists());

    let report = Validator::default().validate(&output, None).unwrap();
    assert!(!report.passed());
    let slide_count = report.get("slide_count").unwrap();
    assert!(!slide_count.passed);
    assert_eq!(report.failures().len(), 1);
}

#[test]
fn draft_markers_in_content_fail_placeholder_check() {
    let (dir, generator) = setup();
    let yaml = "slides:\n  - type: text_only\n    title: Roadmap\n    content: TODO fill in dates\n";
    let output = generate(&dir, &generator, yaml, "draft.pptx");

    let report = Validator::default().validate(&output, Some(1)).unwrap();
    let placeholders = report.get("placeholders").unwrap();
    assert!(!placeholders.passed);
    assert!(placeholders.detail.contains("Slide 1"));
}

#[test]
fn unknown_type_falls_back_and_still_validates() {
    let (dir, generator) = setup();
    let yaml = "slides:\n  - type: comparison\n    left_content: Old\n    right_content: New\n    title: Compare\n";
    let output = generate(&dir, &generator, yaml, "fallback.pptx");

    let deck = DeckReader::open(&output).unwrap();
    assert_eq!(deck.slides[0].layout_index, Some(23));
    assert!(Validator::default().validate(&output, Some(1)).unwrap().passed());
}
