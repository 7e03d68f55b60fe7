// src/services/export_service.rs
//
// Exportação do relatório de tarefas: mesma consulta filtrada da listagem,
// sem paginação, renderizada em planilha (xlsx) ou PDF.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    common::error::AppError,
    db::TaskRepository,
    models::{auth::CurrentUser, report::ExportFormat, task::TaskDetail},
    services::task_query::{TaskFilter, TaskQueryParams},
};

pub const COLUMNS: [&str; 10] = [
    "ID",
    "Title",
    "Description",
    "Goal",
    "Assignee",
    "Status",
    "Priority",
    "Due Date",
    "Created At",
    "Updated At",
];

/// Uma linha do relatório, já formatada como texto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub cells: [String; 10],
}

impl ExportRow {
    pub fn from_task(detail: &TaskDetail) -> Self {
        let task = &detail.task;
        Self {
            cells: [
                task.id.to_string(),
                task.title.clone(),
                task.description.clone().unwrap_or_default(),
                format!("{} - {}", detail.goal.code, detail.goal.title),
                detail
                    .assignee
                    .as_ref()
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| "Unassigned".to_string()),
                task.status.to_string(),
                task.priority.to_string(),
                task.due_date.as_ref().map(format_date).unwrap_or_default(),
                format_timestamp(&task.created_at),
                format_timestamp(&task.updated_at),
            ],
        }
    }
}

fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

pub fn parse_format(raw: Option<&str>) -> Result<ExportFormat, AppError> {
    match raw.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
        Some("excel") | Some("xlsx") => Ok(ExportFormat::Excel),
        Some("pdf") => Ok(ExportFormat::Pdf),
        _ => Err(AppError::bad_request("Query parameter 'format' must be 'excel' or 'pdf'.")),
    }
}

pub fn report_filename(format: ExportFormat, today: DateTime<Utc>) -> String {
    format!("tasks-report-{}.{}", today.format("%Y%m%d"), format.extension())
}

pub fn render_excel(rows: &[ExportRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Tasks").map_err(anyhow::Error::from)?;

        let header = Format::new().set_bold();
        for (col, title) in COLUMNS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *title, &header)
                .map_err(anyhow::Error::from)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let row_num = (index + 1) as u32;
            for (col, value) in row.cells.iter().enumerate() {
                worksheet
                    .write_string(row_num, col as u16, value.as_str())
                    .map_err(anyhow::Error::from)?;
            }
        }
    }

    let buffer = workbook.save_to_buffer().map_err(anyhow::Error::from)?;
    Ok(buffer)
}

pub fn render_pdf(rows: &[ExportRow], font_dir: &str, font_family: &str) -> Result<Vec<u8>, AppError> {
    // Carrega a fonte da pasta configurada
    let fonts = genpdf::fonts::from_files(font_dir, font_family, None)
        .map_err(|e| anyhow::anyhow!("Fonte '{}' não encontrada em {}: {}", font_family, font_dir, e))?;

    let mut doc = genpdf::Document::new(fonts);
    doc.set_title("Tasks Report");
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(elements::Paragraph::new("Tasks Report").styled(style::Style::new().bold().with_font_size(18)));
    doc.push(elements::Paragraph::new(format!("Total: {}", rows.len())));
    doc.push(elements::Break::new(1.5));

    // Um bloco de texto por tarefa
    for row in rows {
        doc.push(
            elements::Paragraph::new(format!("#{} {}", row.cells[0], row.cells[1]))
                .styled(style::Style::new().bold().with_font_size(12)),
        );
        for (label, value) in COLUMNS.iter().zip(row.cells.iter()).skip(2) {
            if !value.is_empty() {
                doc.push(elements::Paragraph::new(format!("{label}: {value}")));
            }
        }
        doc.push(elements::Break::new(1));
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Falha ao renderizar o PDF: {}", e))?;

    Ok(buffer)
}

pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct ExportService {
    task_repo: Arc<dyn TaskRepository>,
    font_dir: String,
    font_family: String,
}

impl ExportService {
    pub fn new(task_repo: Arc<dyn TaskRepository>, font_dir: String, font_family: String) -> Self {
        Self {
            task_repo,
            font_dir,
            font_family,
        }
    }

    pub async fn export(
        &self,
        user: &CurrentUser,
        params: &TaskQueryParams,
        format: ExportFormat,
    ) -> Result<ExportFile, AppError> {
        let filter = TaskFilter::from_params(params)?.scoped_for_export(user)?;
        let tasks = self.task_repo.list(&filter, None).await?;
        let rows: Vec<ExportRow> = tasks.iter().map(ExportRow::from_task).collect();

        tracing::info!(rows = rows.len(), format = format.extension(), "Gerando relatório de tarefas");

        let font_dir = self.font_dir.clone();
        let font_family = self.font_family.clone();
        let bytes = tokio::task::spawn_blocking(move || match format {
            ExportFormat::Excel => render_excel(&rows),
            ExportFormat::Pdf => render_pdf(&rows, &font_dir, &font_family),
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de renderização: {}", e))??;

        Ok(ExportFile {
            bytes,
            filename: report_filename(format, Utc::now()),
            content_type: format.content_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        auth::UserSummary,
        task::{GoalSummary, Task, TaskPriority, TaskStatus},
    };
    use chrono::TimeZone;
    use rstest::rstest;

    fn detail() -> TaskDetail {
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
        TaskDetail {
            task: Task {
                id: 12,
                title: "Write checklist".into(),
                description: None,
                status: TaskStatus::InProgress,
                priority: TaskPriority::Urgent,
                due_date: Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
                goal_id: 3,
                assignee_id: Some(7),
                created_at: created,
                updated_at: created,
            },
            goal: GoalSummary { id: 3, code: "Q1-2024".into(), title: "Onboarding".into(), division_id: 1 },
            assignee: Some(UserSummary { id: 7, name: "Eva".into(), email: "eva@example.com".into() }),
            comments: vec![],
        }
    }

    #[test]
    fn row_has_fixed_columns() {
        let row = ExportRow::from_task(&detail());
        assert_eq!(row.cells[0], "12");
        assert_eq!(row.cells[2], "");
        assert_eq!(row.cells[3], "Q1-2024 - Onboarding");
        assert_eq!(row.cells[4], "Eva");
        assert_eq!(row.cells[5], "IN_PROGRESS");
        assert_eq!(row.cells[7], "2024-01-15");
        assert_eq!(row.cells[8], "2024-01-02 14:30");
    }

    #[test]
    fn unassigned_tasks_are_labelled() {
        let mut unassigned = detail();
        unassigned.assignee = None;
        assert_eq!(ExportRow::from_task(&unassigned).cells[4], "Unassigned");
    }

    #[rstest]
    #[case(Some("excel"), Some(ExportFormat::Excel))]
    #[case(Some("PDF"), Some(ExportFormat::Pdf))]
    #[case(Some("csv"), None)]
    #[case(None, None)]
    fn format_parsing(#[case] raw: Option<&str>, #[case] expected: Option<ExportFormat>) {
        assert_eq!(parse_format(raw).ok(), expected);
    }

    #[test]
    fn filename_carries_date_and_extension() {
        let today = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        assert_eq!(report_filename(ExportFormat::Excel, today), "tasks-report-20240309.xlsx");
        assert_eq!(report_filename(ExportFormat::Pdf, today), "tasks-report-20240309.pdf");
    }

    #[test]
    fn excel_output_is_a_zip_container() {
        let bytes = render_excel(&[ExportRow::from_task(&detail())]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
