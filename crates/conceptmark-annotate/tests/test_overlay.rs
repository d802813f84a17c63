//! End-to-end checks of the rendered markup and derived summaries.
//!
//! Run with: cargo test --package conceptmark-annotate --test test_overlay

use conceptmark_annotate::markup::escape_text;
use conceptmark_annotate::{
    annotate, annotate_publication, build_concept_tree, build_entity_map, has_ambiguous_concepts,
    render, SemanticGroupCatalog,
};
use conceptmark_common::entities::parse_entities;
use conceptmark_common::{AnnotationDocument, EntityRecord, PublicationDocument};
use pretty_assertions::assert_eq;
use regex::Regex;

fn records(entities: &[&str]) -> Vec<EntityRecord> {
    parse_entities(entities).expect("valid entities")
}

fn strip_tags(html: &str) -> String {
    let tags = Regex::new(r"<[^>]*>").unwrap();
    html_escape::decode_html_entities(&tags.replace_all(html, "")).into_owned()
}

const ABSTRACT: &str = "Mutations in BRCA1 increase the risk of breast cancer & ovarian cancer in women.";

fn abstract_entities() -> Vec<EntityRecord> {
    records(&[
        "BRCA1|UNIPROT:P38398:T116:PRGE|13",
        "breast cancer|UMLS:C0006142:T191:DISO|40",
        "ovarian cancer|UMLS:C0029925:T191:DISO|56",
        "women|UMLS:C0043210:T098:SPEC|74",
    ])
}

#[test]
fn test_content_preserved_without_overlaps() {
    let catalog = SemanticGroupCatalog::builtin();
    let html = render(&catalog, ABSTRACT, &abstract_entities()).unwrap();
    assert_eq!(strip_tags(&html), ABSTRACT);
}

#[test]
fn test_content_preserved_with_same_offset_stacks() {
    let catalog = SemanticGroupCatalog::builtin();
    let text = "Patients with diabetes mellitus type 2 were enrolled.";
    let html = render(
        &catalog,
        text,
        &records(&[
            "diabetes|D:1:DISO|14",
            "diabetes mellitus type 2|D:3:DISO|14",
            "diabetes mellitus|D:2:DISO|14",
        ]),
    )
    .unwrap();
    assert_eq!(strip_tags(&html), text);
    assert_eq!(html.matches("<span").count(), 3);
}

#[test]
fn test_no_entities_is_escaped_normalised_text() {
    let catalog = SemanticGroupCatalog::builtin();
    let text = "IL-6 <2 pg/mL>\n\tin  serum & plasma";
    let html = render(&catalog, text, &[]).unwrap();
    assert_eq!(html, escape_text(text));
    assert_eq!(
        html,
        "IL-6 &lt;2 pg&#x2F;mL&gt;<br/>&nbsp; in&nbsp; serum &amp; plasma"
    );
}

#[test]
fn test_rendered_markup_for_single_mention() {
    let catalog = SemanticGroupCatalog::builtin();
    let html = render(&catalog, "  BRCA1 status ", &records(&["BRCA1|G:1:PRGE;G:2:PRGE|0"])).unwrap();
    assert_eq!(
        html,
        r#"<span class="at-0 annotation gene-protein color7" data-concept-ids="G:1:PRGE;G:2:PRGE">BRCA1</span> status"#
    );
}

#[test]
fn test_same_offset_nesting_markup() {
    let catalog = SemanticGroupCatalog::builtin();
    let html = render(
        &catalog,
        "diabetes mellitus type 2",
        &records(&["diabetes mellitus|D:1:DISO|0", "diabetes|D:2:DISO|0"]),
    )
    .unwrap();
    assert_eq!(
        html,
        concat!(
            r#"<span class="at-0 annotation disorder color2" data-concept-ids="D:1:DISO" style="padding:2px 2px">"#,
            r#"<span class="at-0 annotation disorder color2" data-concept-ids="D:2:DISO">diabetes</span>"#,
            " mellitus</span> type 2"
        )
    );
    assert_eq!(html.matches("diabetes").count(), 1, "overlapping text must not repeat");
}

#[test]
fn test_ambiguous_markup() {
    let catalog = SemanticGroupCatalog::builtin();
    let html = render(&catalog, "cold", &records(&["cold|D:1:DISO;P:1:PROC|0"])).unwrap();
    assert!(html.starts_with(
        r#"<span class="at-0 annotation disorder process ambiguous" data-concept-ids="D:1:DISO;P:1:PROC">"#
    ));
}

#[test]
fn test_intersection_markup() {
    let catalog = SemanticGroupCatalog::builtin();
    let html = render(
        &catalog,
        "insulin resistance syndrome",
        &records(&["insulin resistance|D:1:DISO|0", "resistance syndrome|D:2:DISO|8"]),
    )
    .unwrap();
    assert_eq!(
        html,
        concat!(
            r#"<span class="at-0 annotation disorder color2" data-concept-ids="D:1:DISO">insulin <em>resistance</em></span>"#,
            r#"<span class="at-8 annotation disorder color2" data-concept-ids="D:2:DISO" data-term="resistance syndrome" style="border-left:0"> syndrome</span>"#
        )
    );
}

#[test]
fn test_render_is_idempotent() {
    let catalog = SemanticGroupCatalog::builtin();
    let entities = records(&[
        "insulin resistance|D:1:DISO|0",
        "insulin|C:1:CHED|0",
        "resistance syndrome|D:2:DISO|8",
        "syndrome|D:3:DISO|19",
    ]);
    let text = "insulin resistance syndrome";
    let first = render(&catalog, text, &entities).unwrap();
    let second = render(&catalog, text, &entities).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_entity_map_merge() {
    let map = build_entity_map(&["BRCA1|GENE:1:PRGE|5", "BRCA1|GENE:2:PRGE|5"]).unwrap();
    let bucket = map.get(5).unwrap();
    assert_eq!(bucket.len(), 1);
    assert_eq!(bucket[0].ids, vec!["GENE:1:PRGE", "GENE:2:PRGE"]);
}

#[test]
fn test_classify_many_examples() {
    let catalog = SemanticGroupCatalog::builtin();
    let single = catalog.classify_many(&["D:1:DISO"]).unwrap();
    assert_eq!(single.css(), "disorder");
    assert!(!single.is_ambiguous());

    let mixed = catalog.classify_many(&["D:1:DISO", "G:1:PRGE"]).unwrap();
    let css = mixed.css();
    assert!(css.contains("disorder") && css.contains("gene-protein") && css.contains("ambiguous"));
    assert!(mixed.is_ambiguous());
}

#[test]
fn test_ambiguity_examples() {
    assert!(has_ambiguous_concepts(&records(&["x|A:1:DISO;A:2:PRGE|0"])));
    assert!(!has_ambiguous_concepts(&records(&["x|A:1:DISO;A:2:DISO|0"])));
}

#[test]
fn test_concept_tree_case_duplicates() {
    let catalog = SemanticGroupCatalog::builtin();
    let tree = build_concept_tree(&catalog, &records(&["Insulin|A:1:CHED|0", "insulin|A:1:CHED|20"]));
    let chemicals = tree.group("Chemicals").unwrap();
    assert_eq!(chemicals.keys().collect::<Vec<_>>(), vec!["Insulin"]);
}

#[test]
fn test_annotate_document() {
    let doc = AnnotationDocument::from_json(
        r#"{
            "text": "Mutations in BRCA1 increase the risk of breast cancer & ovarian cancer in women.",
            "entities": [
                "BRCA1|UNIPROT:P38398:T116:PRGE|13",
                "breast cancer|UMLS:C0006142:T191:DISO|40",
                "ovarian cancer|UMLS:C0029925:T191:DISO|56",
                "women|UMLS:C0043210:T098:SPEC|74"
            ],
            "ids": {
                "UNIPROT:P38398:T116:PRGE": {"name": "BRCA1", "refs": ["UNIPROT:P38398"]}
            }
        }"#,
    )
    .unwrap();

    let catalog = SemanticGroupCatalog::builtin();
    let result = annotate(&catalog, &doc).unwrap();

    assert_eq!(strip_tags(&result.markup), ABSTRACT);
    let summary = &result.summary;
    assert!(!summary.has_ambiguous_concepts);
    assert_eq!(summary.group_counts["Disorders"], 2);
    assert_eq!(summary.group_counts["Species"], 1);
    assert_eq!(summary.concept_tree.term_count(), 4);
    assert_eq!(summary.term_positions["brca1"], vec![13]);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["group_counts"]["Genes and Proteins"], 1);
}

#[test]
fn test_annotate_rejects_malformed_entities() {
    let doc = AnnotationDocument {
        text: "x".into(),
        entities: vec!["x|A:1:DISO|not-a-number".into()],
        ..Default::default()
    };
    assert!(annotate(&SemanticGroupCatalog::builtin(), &doc).is_err());
}

const PUBLICATION: &str = r#"{
    "pmid": "20301425",
    "title": "BRCA1 and breast cancer",
    "abstract": "BRCA1 carriers develop breast cancer early.",
    "entities_title": [
        "BRCA1|G:1:PRGE|0",
        "breast cancer|D:1:DISO|10"
    ],
    "entities_abstract": [
        "BRCA1|G:1:PRGE|0",
        "breast cancer|D:1:DISO|23"
    ],
    "authors": ["Doe J"],
    "journal": "Oncogene",
    "pubdate": "2010"
}"#;

#[test]
fn test_publication_title_and_abstract_render_separately() {
    let publication = PublicationDocument::from_json(PUBLICATION).unwrap();
    let result = annotate_publication(&SemanticGroupCatalog::builtin(), &publication).unwrap();

    assert_eq!(strip_tags(&result.title_markup), "BRCA1 and breast cancer");
    assert!(result
        .title_markup
        .starts_with(r#"<span class="at-0 annotation gene-protein color7" data-concept-ids="G:1:PRGE">BRCA1</span>"#));
    assert!(result.title_markup.contains(r#"<span class="at-10 annotation disorder color2""#));

    let abstract_markup = result.abstract_markup.as_deref().unwrap();
    assert_eq!(strip_tags(abstract_markup), "BRCA1 carriers develop breast cancer early.");
    assert!(abstract_markup.contains(r#"<span class="at-23 annotation disorder color2""#));
    assert_eq!(result.journal.as_deref(), Some("Oncogene"));
}

#[test]
fn test_publication_record_in_both_lists_counts_once() {
    let publication = PublicationDocument::from_json(PUBLICATION).unwrap();
    let result = annotate_publication(&SemanticGroupCatalog::builtin(), &publication).unwrap();

    // "BRCA1|G:1:PRGE|0" appears in both lists.
    assert_eq!(result.summary.group_counts["Genes and Proteins"], 1);
    assert_eq!(result.summary.term_positions["brca1"], vec![0]);
    assert_eq!(result.summary.group_counts["Disorders"], 2);
    assert_eq!(result.summary.term_positions["breast cancer"], vec![10, 23]);
    assert!(!result.summary.has_ambiguous_concepts);
}

#[test]
fn test_publication_abstract_without_entities_is_plain() {
    let publication = PublicationDocument::from_json(
        r#"{
            "pmid": 1,
            "title": "Influenza in <b>winter</b>",
            "abstract": "No  recognized concepts here.",
            "entities_title": ["Influenza|D:1:DISO|0"]
        }"#,
    )
    .unwrap();
    let result = annotate_publication(&SemanticGroupCatalog::builtin(), &publication).unwrap();

    assert_eq!(result.abstract_markup.as_deref(), Some("No&nbsp; recognized concepts here."));
    assert!(result.title_markup.contains("&lt;b&gt;winter&lt;&#x2F;b&gt;"));
    assert_eq!(result.summary.concept_tree.term_count(), 1);
}

#[test]
fn test_publication_without_abstract() {
    let publication = PublicationDocument::from_json(
        r#"{"pmid": "7", "title": "Asthma", "entities_title": ["Asthma|D:1:DISO|0"]}"#,
    )
    .unwrap();
    let result = annotate_publication(&SemanticGroupCatalog::builtin(), &publication).unwrap();
    assert!(result.abstract_markup.is_none());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["pmid"], "7");
    assert_eq!(json["group_counts"]["Disorders"], 1);
}
