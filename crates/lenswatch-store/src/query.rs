//! DQL query templates

/// Lens root with its scope, each member's forward edges expanded one level,
/// and the `~scope` back-references the visibility filter needs.
pub const LENS_SCOPE_QUERY: &str = r#"
    query q0($a: string)
    {
        q0(func: eq(lens, $a)) {
            uid,
            node_key,
            lens,
            score,
            scope {
                uid,
                expand(_forward_) {
                    uid,
                    node_key,
                    process_name,
                    process_id,
                    file_path,
                    node_type,
                    port,
                    created_timestamp,
                    analyzer_name,
                    risk_score,
                    ~scope @filter(eq(lens, $a) OR has(risk_score)) {
                        uid, node_key, analyzer_name, risk_score,
                        lens, score
                    }
                }
            }
        }
    }"#;

/// Lenses whose name full-text matches `$a`, best score first.
pub const LENS_SEARCH_QUERY: &str = r#"
    query q0($a: string)
    {
        q0(func: alloftext(lens, $a), orderdesc: score)
        {
            uid,
            node_key,
            lens,
            score
        }
    }"#;

/// Every lens, best score first.
pub const ALL_LENSES_QUERY: &str = r#"
    {
        q0(func: has(lens), orderdesc: score)
        {
            uid,
            node_key,
            lens,
            score
        }
    }"#;

/// Pick the listing query and its variables for a prefix.
pub fn lens_listing(prefix: &str) -> (&'static str, Option<(&'static str, String)>) {
    if prefix.is_empty() {
        (ALL_LENSES_QUERY, None)
    } else {
        (LENS_SEARCH_QUERY, Some(("$a", prefix.to_string())))
    }
}
