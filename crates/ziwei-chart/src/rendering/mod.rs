//! HTML rendering of a chart.

pub mod html;

pub use html::{escape_html, render_html_grid, GridRenderer, GridSettings};

/// Stylesheet for the markup produced by [`GridRenderer`].
pub const CSS_STYLE: &str = r#"<style>
.ziwei-grid {
    display: grid;
    grid-template-columns: repeat(4, 1fr);
    grid-template-rows: repeat(4, 1fr);
    gap: 2px;
    background-color: #000;
    border: 3px solid #000;
    font-family: "Microsoft YaHei", sans-serif;
    box-sizing: border-box;
    margin: 20px 0;
    height: 550px;
}
.palace-cell {
    background-color: #fff;
    border: 1px solid #ddd;
    padding: 5px;
    display: flex;
    flex-direction: column;
    justify-content: space-between;
    overflow: hidden;
    position: relative;
    font-size: 0.75em;
    line-height: 1.2;
}
.center-cell {
    grid-column: 2 / 4;
    grid-row: 2 / 4;
    background-color: #f9f9f9;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    text-align: center;
    padding: 20px;
    border: 2px solid #000;
}
.center-cell * { font-size: 0.8em; line-height: 1.3; }
.center-cell .center-title { font-size: 1.1em; }
.stars-box { flex: 1; display: flex; flex-direction: column; justify-content: space-between; }
.star-section { margin-bottom: 5px; line-height: 1.3; }
.star-major { color: #c62828; font-weight: bold; font-size: 1.3em; margin-right: 2px; display: inline-block; }
.star-minor { color: #1565c0; font-size: 1.2em; margin-right: 2px; display: inline-block; }
.star-adj { color: #6d4c41; font-size: 1.1em; margin-right: 2px; display: inline-block; }
.mut-birth, .mut-decadal, .mut-yearly {
    border-radius: 2px;
    padding: 0 2px;
    font-size: 1.2em;
    margin-left: 2px;
    font-weight: bold;
    display: inline-block;
    white-space: nowrap;
}
.mut-birth { background-color: #ffeb3b; color: #d81b60; }
.mut-decadal { background-color: #4fc3f7; color: #1565c0; }
.mut-yearly { background-color: #ce93d8; color: #6a1b9a; }
.palace-footer { margin-top: 5px; padding-top: 5px; border-top: 1px dashed #ddd; text-align: center; font-size: 0.9em; }
.palace-name { font-weight: bold; color: #d32f2f; margin-right: 5px; }
.palace-dizhi { font-weight: bold; color: #1976d2; }
.palace-age { font-size: 0.8em; color: #666; margin-top: 2px; }
.luck-indicator {
    background-color: #ffeb3b;
    color: #d32f2f;
    font-weight: bold;
    font-size: 0.8em;
    padding: 2px 6px;
    border-radius: 8px;
    margin-bottom: 5px;
    text-align: center;
}
</style>"#;
