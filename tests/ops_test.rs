use serde_json::{json, Value};
use trend_topology::ops;
use trend_topology::PipelineConfig;

fn sample_records() -> Vec<Value> {
    vec![
        json!({
            "id": "p1",
            "title": "Banarasi **silk** saree for a Delhi wedding",
            "body": "Pics: https://i.redd.it/abc.jpg",
            "origin": "IndianFashion",
            "score": 120,
            "engagement_count": 14
        }),
        json!({
            "id": "p2",
            "title": "Kurta sets under 2k?",
            "body": "Looking for cotton [kurta](https://myntra.com/k) options",
            "origin": "IndianFashionAddicts",
            "score": 45,
            "engagement_count": 30
        }),
        json!({
            "id": "p3",
            "title": "Kerala kasavu saree",
            "body": "Onam ready, silk silk silk",
            "origin": "IndianFashion",
            "score": 300,
            "engagement_count": 52
        }),
        json!({
            "id": "p4",
            "title": "Cricket thread",
            "body": "Who won yesterday?",
            "origin": "india",
            "score": 2
        }),
        json!({"id": "p5", "title": "", "body": null, "origin": "india"}),
    ]
}

#[test]
fn ops_clean_strips_markup() {
    let result = ops::op_clean(&sample_records(), "reddit").unwrap();
    let arr = result.as_array().unwrap();
    assert_eq!(arr.len(), 5);
    assert_eq!(arr[0]["clean_title"], "Banarasi silk saree for a Delhi wedding");
    assert_eq!(arr[0]["clean_body"], "Pics");
    assert_eq!(arr[1]["clean_body"], "Looking for cotton kurta options");
    // Original fields survive alongside the cleaned ones.
    assert_eq!(arr[0]["title"], "Banarasi **silk** saree for a Delhi wedding");
    assert_eq!(arr[0]["source_name"], "reddit");
}

#[test]
fn ops_tag_drops_irrelevant_by_default() {
    let config = PipelineConfig::embedded();
    let result = ops::op_tag(&sample_records(), "reddit", &config, false).unwrap();
    let arr = result.as_array().unwrap();
    let ids: Vec<&str> = arr.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert!(arr.iter().all(|r| r["relevant"] == true));
    assert_eq!(arr[0]["region"], "North_India");
    assert_eq!(arr[2]["region"], "South_India");
    let keywords: Vec<&str> = arr[0]["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap())
        .collect();
    assert_eq!(keywords, vec!["banarasi", "saree", "silk", "wedding"]);
}

#[test]
fn ops_tag_keep_all_flags_rejects() {
    let config = PipelineConfig::embedded();
    let result = ops::op_tag(&sample_records(), "reddit", &config, true).unwrap();
    let arr = result.as_array().unwrap();
    assert_eq!(arr.len(), 5);
    assert_eq!(arr[3]["relevant"], false);
    assert!(arr[3].get("malformed").is_none());
    assert_eq!(arr[4]["relevant"], false);
    assert_eq!(arr[4]["malformed"], true);
}

#[test]
fn ops_tag_strict_rejects_malformed() {
    let config = PipelineConfig::embedded().with_strict(true);
    let result = ops::op_tag(&sample_records(), "reddit", &config, false);
    assert!(result.unwrap_err().contains("p5"));
}

#[test]
fn ops_tag_strict_wins_over_keep_all() {
    let config = PipelineConfig::embedded().with_strict(true);
    let rows = vec![json!({"id": "ok", "title": "saree"}), json!({"id": "bad", "title": ""})];
    let err = ops::op_tag(&rows, "reddit", &config, true).unwrap_err();
    assert!(err.contains("bad"));
}

#[test]
fn ops_aggregate_accepts_float_and_integer_numbers() {
    let config = PipelineConfig::embedded();
    let rows = vec![
        json!({"id": "a", "title": "saree", "created_at": 1704067200.0}),
        json!({"id": 7, "title": "kurta"}),
        json!({"id": "c", "title": "lehenga", "score": 12.0}),
    ];
    let result = ops::op_aggregate(&rows, "reddit", &config, None).unwrap();
    assert_eq!(result["document_count"], 3);
    assert_eq!(result["engagement"]["max_score"], 12);
}

#[test]
fn ops_aggregate_returns_tables() {
    let config = PipelineConfig::embedded();
    let result = ops::op_aggregate(&sample_records(), "reddit", &config, None).unwrap();
    assert_eq!(result["source"], "reddit");
    assert_eq!(result["document_count"], 3);
    assert_eq!(result["keywords"][0], json!({"term": "saree", "count": 2}));
    assert_eq!(
        result["facets"]["fabrics_materials"],
        json!([
            {"term": "silk", "count": 2},
            {"term": "cotton", "count": 1},
            {"term": "banarasi", "count": 1}
        ])
    );
    assert_eq!(result["mentions"]["fabrics_materials"][0], json!({"term": "silk", "count": 4}));
    assert_eq!(
        result["origins"],
        json!([{"term": "IndianFashion", "count": 2}, {"term": "IndianFashionAddicts", "count": 1}])
    );
    assert_eq!(result["engagement"]["max_score"], 300);
}

#[test]
fn ops_aggregate_top_truncates() {
    let config = PipelineConfig::embedded();
    let result = ops::op_aggregate(&sample_records(), "reddit", &config, Some(1)).unwrap();
    assert_eq!(result["keywords"].as_array().unwrap().len(), 1);
    assert_eq!(result["document_count"], 3);
}

#[test]
fn ops_aggregate_empty() {
    let config = PipelineConfig::embedded();
    let result = ops::op_aggregate(&[], "web", &config, None).unwrap();
    assert_eq!(result["document_count"], 0);
    assert_eq!(result["keywords"], json!([]));
}

#[test]
fn ops_compare_sets() {
    let result = ops::op_compare(&[json!("saree")], &[json!("saree"), json!("lehenga")]).unwrap();
    assert_eq!(result["common"], json!(["saree"]));
    assert_eq!(result["source_a_only"], json!([]));
    assert_eq!(result["source_b_only"], json!(["lehenga"]));
    assert_eq!(result["counts"], json!({"a": 1, "b": 2, "common": 1}));
}

#[test]
fn ops_compare_rejects_non_strings() {
    assert!(ops::op_compare(&[json!(1)], &[]).is_err());
}

#[test]
fn ops_report_compares_discussion_and_web() {
    let config = PipelineConfig::embedded();
    let discussion = json!({
        "IndianFashion": [
            {"id": "r1", "title": "Saree draping tips", "body": "", "score": 10,
             "num_comments": 2, "created": 1704067200},
            {"id": "r2", "title": "Jhumka haul", "body": "kundan and polki", "score": 4,
             "num_comments": 1, "created": 1706745600}
        ],
        "scrape_info": {"total_items": 2, "last_updated": "2024-02-01T00:00:00"}
    });
    let web = json!({
        "search_results": {
            "lehenga trends": {
                "raw_results": [
                    {"title": "Lehenga and saree trends", "snippet": "Sabyasachi bridal",
                     "link": "https://www.vogue.in/l"}
                ]
            }
        }
    });
    let report = ops::op_report(&discussion, &web, &config, None).unwrap();
    let cmp = &report["comparisons"][0];
    assert_eq!(cmp["source_a"], "reddit");
    assert_eq!(cmp["source_b"], "web");
    assert_eq!(cmp["common"], json!(["saree"]));
    assert_eq!(cmp["source_a_only"], json!(["jhumka", "kundan", "polki"]));
    assert_eq!(cmp["source_b_only"], json!(["lehenga", "sabyasachi"]));
    assert_eq!(report["aggregations"]["web"]["domains"][0]["term"], "vogue.in");
    assert_eq!(report["summary"]["total_documents"], 3);
    assert_eq!(
        report["summary"]["date_range"],
        json!({"earliest": "2024-01-01", "latest": "2024-02-01"})
    );
}

#[test]
fn ops_prompt_renders_text() {
    let config = PipelineConfig::embedded();
    let discussion = json!([{"id": "r1", "title": "Saree love"}]);
    let web = json!({
        "organic": [{"title": "Saree trends", "snippet": "", "link": "https://femina.in"}]
    });
    let prompt = ops::op_prompt(&discussion, &web, &config).unwrap();
    assert!(prompt.contains("REDDIT DATA:"));
    assert!(prompt.contains("WEB DATA:"));
    assert!(prompt.contains("- Common: saree"));
}
