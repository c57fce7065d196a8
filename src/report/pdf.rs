//! Renders a laid out [ExpenseReport] to PDF bytes.
//!
//! Documents are rendered twice: the first pass only counts the pages genpdf
//! produces, so that the second pass can print "Page N of M" footers with
//! the real page count.

use std::{cell::Cell, io, path::PathBuf, rc::Rc};

use genpdf::{
    Alignment, Context, Document, Element, Margins, Mm, PageDecorator, Position, Size,
    elements::{Break, FrameCellDecorator, PageBreak, Paragraph, TableLayout},
    fonts::{self, FontCache, FontData, FontFamily},
    render::Area,
    style::Style,
};

use crate::{
    Error,
    report::{ExpenseReport, ReportPage, TABLE_HEADINGS, page_footer},
};

/// The font family used when none is configured.
pub const DEFAULT_REPORT_FONT_FAMILY: &str = "LiberationSans";

const PAPER_SIZE_MM: (i32, i32) = (210, 297);
const PAGE_MARGIN_MM: i32 = 15;
const FOOTER_HEIGHT_MM: i32 = 8;
const CELL_PADDING_MM: i32 = 1;
// Room for the frame lines either side of a cell.
const CELL_FRAME_MM: i32 = 1;
const COLUMN_WEIGHTS: [usize; 5] = [2, 2, 3, 5, 2];
const ELLIPSIS: &str = "...";

/// Where the fonts for PDF reports are loaded from.
///
/// `dir` must contain `{family}-Regular.ttf`, `{family}-Bold.ttf`,
/// `{family}-Italic.ttf` and `{family}-BoldItalic.ttf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFonts {
    /// The directory with the TTF files.
    pub dir: PathBuf,
    /// The font family name, the part of the file names before the dash.
    pub family: String,
}

impl ReportFonts {
    /// The fonts of `family` in `dir`.
    pub fn new(dir: impl Into<PathBuf>, family: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            family: family.into(),
        }
    }

    fn load(&self) -> Result<FontFamily<FontData>, Error> {
        fonts::from_files(&self.dir, &self.family, None).map_err(|error| {
            Error::ReportError(format!(
                "could not load the {} fonts from {}: {error}",
                self.family,
                self.dir.display()
            ))
        })
    }
}

/// Render `report` as an A4 PDF document.
///
/// # Errors
///
/// Returns [Error::ReportError] if the fonts cannot be loaded or the document
/// cannot be rendered.
pub fn render_pdf(report: &ExpenseReport, fonts: &ReportFonts) -> Result<Vec<u8>, Error> {
    render_counting_pages(report, fonts).map(|(pdf, _)| pdf)
}

/// Render `report` and return the PDF along with the number of pages in it.
fn render_counting_pages(
    report: &ExpenseReport,
    fonts: &ReportFonts,
) -> Result<(Vec<u8>, usize), Error> {
    let font_family = fonts.load()?;
    let pages_rendered = Rc::new(Cell::new(0));

    build_document(report, font_family.clone(), None, Rc::clone(&pages_rendered))?
        .render(io::sink())
        .map_err(render_error)?;
    let page_count = pages_rendered.get();

    let mut buffer = Vec::new();
    build_document(
        report,
        font_family,
        Some(page_count),
        Rc::clone(&pages_rendered),
    )?
    .render(&mut buffer)
    .map_err(render_error)?;

    if pages_rendered.get() != page_count {
        tracing::warn!(
            "Report rendered to {} pages after counting {page_count}",
            pages_rendered.get()
        );
    }

    Ok((buffer, pages_rendered.get()))
}

fn build_document(
    report: &ExpenseReport,
    font_family: FontFamily<FontData>,
    page_count: Option<usize>,
    pages_rendered: Rc<Cell<usize>>,
) -> Result<Document, Error> {
    let mut doc = Document::new(font_family);
    doc.set_title(report.title.as_str());
    doc.set_paper_size(Size::new(PAPER_SIZE_MM.0, PAPER_SIZE_MM.1));
    doc.set_page_decorator(FooterDecorator {
        page: 0,
        page_count,
        pages_rendered,
    });

    doc.push(
        Paragraph::new(report.title.as_str())
            .aligned(Alignment::Center)
            .styled(Style::new().with_font_size(18).bold()),
    );
    doc.push(
        Paragraph::new(report.generated_on.as_str())
            .aligned(Alignment::Center)
            .styled(Style::new().with_font_size(9)),
    );
    doc.push(Break::new(1));

    let summary_style = Style::new().with_font_size(11);
    for line in report.summary.lines() {
        doc.push(Paragraph::new(line).styled(summary_style));
    }
    doc.push(Break::new(1));

    for (index, page) in report.pages.iter().enumerate() {
        if index > 0 {
            doc.push(PageBreak::new());
        }

        let table = page_table(page, doc.font_cache())?;
        doc.push(table);
    }

    Ok(doc)
}

/// Draws the page margins and a "Page N of M" footer at the bottom of every
/// page, and keeps the content clear of the footer.
struct FooterDecorator {
    page: usize,
    /// `None` while counting pages.
    page_count: Option<usize>,
    pages_rendered: Rc<Cell<usize>>,
}

impl PageDecorator for FooterDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, genpdf::error::Error> {
        self.page += 1;
        self.pages_rendered.set(self.page);

        area.add_margins(Margins::all(PAGE_MARGIN_MM));
        let content_height = area.size().height - Mm::from(FOOTER_HEIGHT_MM);

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, content_height));
        let mut footer = Paragraph::new(page_footer(
            self.page,
            self.page_count.unwrap_or(self.page),
        ))
        .aligned(Alignment::Center)
        .styled(Style::new().with_font_size(8));
        footer.render(context, footer_area, style)?;

        area.set_height(content_height);
        Ok(area)
    }
}

fn page_table(page: &ReportPage, font_cache: &FontCache) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(COLUMN_WEIGHTS.to_vec());
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let heading_style = Style::new().with_font_size(9).bold();
    let cell_style = Style::new().with_font_size(9);
    let widths = column_text_widths();

    let mut header = table.row();
    for heading in TABLE_HEADINGS {
        header.push_element(
            Paragraph::new(heading)
                .styled(heading_style)
                .padded(Margins::all(CELL_PADDING_MM)),
        );
    }
    header.push().map_err(table_error)?;

    for row in &page.rows {
        let mut table_row = table.row();
        for (column, cell) in row.cells().into_iter().enumerate() {
            let alignment = if column == TABLE_HEADINGS.len() - 1 {
                Alignment::Right
            } else {
                Alignment::Left
            };
            table_row.push_element(
                Paragraph::new(fit_to_width(cell, cell_style, font_cache, widths[column]))
                    .aligned(alignment)
                    .styled(cell_style)
                    .padded(Margins::all(CELL_PADDING_MM)),
            );
        }
        table_row.push().map_err(table_error)?;
    }

    Ok(table)
}

/// The widths available to the text of each column, inside padding and frame.
fn column_text_widths() -> [Mm; 5] {
    let table_width = Mm::from(PAPER_SIZE_MM.0 - 2 * PAGE_MARGIN_MM);
    let total_weight: usize = COLUMN_WEIGHTS.iter().sum();
    let inset = Mm::from(2 * CELL_PADDING_MM + CELL_FRAME_MM);

    COLUMN_WEIGHTS.map(|weight| table_width * (weight as f64 / total_weight as f64) - inset)
}

/// Shorten `text` with an ellipsis until it fits on one line of `max_width`,
/// so that genpdf never wraps a table row.
fn fit_to_width(text: &str, style: Style, font_cache: &FontCache, max_width: Mm) -> String {
    if style.str_width(font_cache, text) <= max_width {
        return text.to_owned();
    }

    let mut chars: Vec<char> = text.chars().collect();
    while chars.pop().is_some() {
        let shortened: String = chars.iter().collect();
        let candidate = format!("{}{ELLIPSIS}", shortened.trim_end());
        if style.str_width(font_cache, &candidate) <= max_width {
            return candidate;
        }
    }

    String::new()
}

fn table_error(error: genpdf::error::Error) -> Error {
    Error::ReportError(format!("could not build report table: {error}"))
}

fn render_error(error: genpdf::error::Error) -> Error {
    Error::ReportError(format!("could not render PDF: {error}"))
}
