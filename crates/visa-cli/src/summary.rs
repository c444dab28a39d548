use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::{PredictResult, TrainResult};

pub fn print_train_summary(result: &TrainResult) {
    let run = &result.run;
    println!("Run: {} ({})", run.pipeline_name, run.timestamp);
    println!("Artifacts: {}", run.artifact_dir.display());
    println!("Summary: {}", result.summary_file.display());

    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Output")]);
    apply_summary_table_style(&mut table);
    table.add_row(vec![
        Cell::new("Ingestion"),
        Cell::new(format!(
            "{}\n{}",
            run.data_ingestion.trained_file_path.display(),
            run.data_ingestion.test_file_path.display()
        )),
    ]);
    table.add_row(vec![
        Cell::new("Validation"),
        Cell::new(run.data_validation.report_file_path.display()),
    ]);
    table.add_row(vec![
        Cell::new("Transformation"),
        Cell::new(
            run.data_transformation
                .transformed_object_file_path
                .display(),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Model"),
        Cell::new(run.model_trainer.trained_model_file_path.display()),
    ]);
    if let Some(pushed) = &result.pushed {
        table.add_row(vec![
            Cell::new("Pushed"),
            Cell::new(format!("{}/{}", pushed.bucket_name, pushed.model_key)),
        ]);
    }
    println!("{table}");

    let metrics = &run.model_trainer.metric_artifact;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Model"),
        header_cell("CV accuracy"),
        header_cell("Test accuracy"),
        header_cell("F1"),
        header_cell("Precision"),
        header_cell("Recall"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(&run.model_trainer.model_name)
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        score_cell(run.model_trainer.best_score),
        score_cell(metrics.accuracy),
        score_cell(metrics.f1_score),
        score_cell(metrics.precision_score),
        score_cell(metrics.recall_score),
    ]);
    println!("{table}");
}

pub fn print_predict_summary(result: &PredictResult) {
    println!("Model: {}", result.model);
    println!("Output: {}", result.output.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Certified"),
        header_cell("Denied"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(result.rows).add_attribute(Attribute::Bold),
        count_cell(result.certified, Color::Green),
        count_cell(result.denied, Color::Red),
    ]);
    println!("{table}");
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn score_cell(score: f64) -> Cell {
    Cell::new(format!("{score:.4}"))
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
