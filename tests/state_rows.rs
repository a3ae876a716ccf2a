use cricwidget::state::{AppState, MatchSummary, summary_row};

fn summaries(names: &[&str]) -> Vec<MatchSummary> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| MatchSummary {
            id: format!("m{idx}"),
            name: name.to_string(),
            status: "Live".to_string(),
        })
        .collect()
}

#[test]
fn cursor_wraps_both_ways() {
    let mut state = AppState::new();
    state.summaries = Some(summaries(&["A vs B", "C vs D", "E vs F"]));

    state.select_prev();
    assert_eq!(state.cursor, 2);
    state.select_next();
    assert_eq!(state.cursor, 0);
    state.select_next();
    assert_eq!(state.match_under_cursor().map(|m| m.id.as_str()), Some("m1"));
}

#[test]
fn cursor_on_empty_list_stays_at_zero() {
    let mut state = AppState::new();
    state.select_next();
    state.select_prev();
    assert_eq!(state.cursor, 0);
    assert!(state.match_under_cursor().is_none());

    state.summaries = Some(Vec::new());
    state.select_next();
    assert_eq!(state.cursor, 0);
}

#[test]
fn clamp_cursor_after_shorter_list() {
    let mut state = AppState::new();
    state.summaries = Some(summaries(&["A vs B", "C vs D", "E vs F"]));
    state.cursor = 2;
    state.summaries = Some(summaries(&["A vs B"]));
    state.clamp_cursor();
    assert_eq!(state.cursor, 0);
}

#[test]
fn summary_row_shows_name_and_status() {
    let rows = summaries(&["IND vs AUS"]);
    assert_eq!(summary_row(&rows[0]), "IND vs AUS — Live");
}

#[test]
fn find_match_by_id() {
    let mut state = AppState::new();
    assert!(state.find_match("m0").is_none());
    state.summaries = Some(summaries(&["A vs B", "C vs D"]));
    assert_eq!(state.find_match("m1").map(|m| m.name.as_str()), Some("C vs D"));
}
