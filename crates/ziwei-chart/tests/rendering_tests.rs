use ziwei_chart::calendar::solar_time::{true_solar_time, DEFAULT_LONGITUDE};
use ziwei_chart::chart::data::Star;
use ziwei_chart::rendering::{render_html_grid, GridRenderer, GridSettings, CSS_STYLE};
use ziwei_chart::ChartData;

fn sample_chart() -> ChartData {
    ChartData::from_json(include_str!("fixtures/sample_chart.json")).unwrap()
}

/// Slice of the grid belonging to the palace cell that names `palace`.
fn cell_of<'a>(html: &'a str, palace: &str) -> &'a str {
    let marker = format!(r#"<span class="palace-name">{palace}</span>"#);
    let end = html.find(&marker).unwrap();
    let start = html[..end].rfind(r#"<div class="palace-cell">"#).unwrap();
    &html[start..end]
}

#[test]
fn test_cells_follow_branch_layout() {
    let html = render_html_grid(Some(&sample_chart()), None);
    assert!(!html.contains('\n'));
    assert_eq!(html.matches(r#"<div class="palace-cell">"#).count(), 12);

    let order = ["兄弟", "命宫", "父母", "福德", "夫妻", "田宅", "子女", "官禄", "财帛", "疾厄", "迁移", "仆役"];
    let positions: Vec<usize> = order
        .iter()
        .map(|name| html.find(&format!(r#"<span class="palace-name">{name}</span>"#)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    let center = html.find(r#"<div class="center-cell">"#).unwrap();
    assert!(positions[4] < center && center < positions[5]);
}

#[test]
fn test_transformation_badges() {
    let html = render_html_grid(Some(&sample_chart()), None);
    let cell = cell_of(&html, "夫妻");
    assert!(cell.contains(r#"<span class="star-major">廉贞[利]</span><span class="mut-birth">[↑禄]</span><span class="mut-decadal">[限禄]</span><span class="mut-yearly">[流忌]</span>"#));

    let cell = cell_of(&html, "迁移");
    assert!(cell.contains(r#"天机[平]</span><span class="mut-yearly">[流权]</span>"#));
}

#[test]
fn test_current_decade_is_marked_once() {
    let html = render_html_grid(Some(&sample_chart()), None);
    assert_eq!(html.matches("luck-indicator").count(), 1);
    assert!(cell_of(&html, "福德").contains("当前大限"));
}

#[test]
fn test_adjective_stars_are_filtered_and_capped() {
    let chart = sample_chart();
    let html = render_html_grid(Some(&chart), None);
    let cell = cell_of(&html, "命宫");
    assert!(!cell.contains("天才"));
    assert!(cell.contains("红鸾") && cell.contains("天喜") && cell.contains("台辅"));

    let renderer = GridRenderer::with_settings(GridSettings {
        max_adjective_stars: 1,
        ..Default::default()
    });
    let html = renderer.render(Some(&chart), None);
    let cell = cell_of(&html, "命宫");
    assert!(cell.contains("红鸾"));
    assert!(!cell.contains("天喜"));
}

#[test]
fn test_text_is_escaped() {
    let mut chart = sample_chart();
    chart.astrolabe.palaces[0].major_stars.push(Star {
        name: Some("<b>假星</b>".into()),
        ..Default::default()
    });
    let html = render_html_grid(Some(&chart), None);
    assert!(html.contains("&lt;b&gt;假星&lt;/b&gt;"));
    assert!(!html.contains("<b>"));
}

#[test]
fn test_center_uses_solar_result() {
    let chart = sample_chart();
    let solar = true_solar_time(2000, 5, 23, 10, 50, DEFAULT_LONGITUDE).unwrap();
    let html = render_html_grid(Some(&chart), Some(&solar));
    assert!(html.contains(&format!("<div>真太阳时: {}</div>", solar.true_solar_time)));
    assert!(html.contains("<div>钟表时间: 2000-5-23 10:50</div>"));
    assert!(html.contains("<div>命主: 破军; 身主: 天相</div>"));

    let html = render_html_grid(Some(&chart), None);
    assert!(html.contains("<div>钟表时间: 2000-5-23 09:00</div>"));
}

#[test]
fn test_stylesheet_covers_badges() {
    for class in [".ziwei-grid", ".mut-birth", ".mut-decadal", ".mut-yearly", ".luck-indicator"] {
        assert!(CSS_STYLE.contains(class), "missing {class}");
    }
}
