//! Plot composition and PNG encoding.
//!
//! `Renderer::render` always returns a `PlotImage`. A request goes through two states:
//!
//! - normal render: validate the range, compile every expression, sample them on a
//!   `SampleGrid`, draw the figure
//! - diagnostic render: any `PlotError` raised on the way is drawn as
//!   `"Error: <message>"` centred on a blank canvas
//!
//! Both end in the same PNG encoder. Every render draws into its own pixel buffer and
//! compiles its own kernels, which are dropped before `render` returns on either path.

use std::io::Cursor;
use std::ops::Range as AxisRange;

use image::{DynamicImage, ImageFormat, RgbImage};
use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rayon::prelude::*;

use crate::{
    errors::PlotError,
    fonts::{self, FONT_FAMILY},
    function::Backend,
    grid::{Range, SampleGrid, SeriesResult},
    request::PlotRequest,
};

/// Canvas size: 6 x 4 inches at 150 dpi.
pub const PLOT_WIDTH: u32 = 900;
pub const PLOT_HEIGHT: u32 = 600;

/// Titles longer than this are truncated.
pub const TITLE_MAX_CHARS: usize = 45;
/// Characters of the expression list kept in a truncated title.
pub const TITLE_EXPRESSION_CHARS: usize = 25;

const FONT_SIZE_TITLE: i32 = 22;
const FONT_SIZE_AXIS_DESC: i32 = 18;
const FONT_SIZE_TICK: i32 = 14;
const FONT_SIZE_LEGEND: i32 = 14;
const FONT_SIZE_MESSAGE: i32 = 18;

const LINE_WIDTH_SERIES: u32 = 2;
const LINE_WIDTH_ZERO: u32 = 1;
const DIAGNOSTIC_LINE_CHARS: usize = 70;

/// Vertical padding around the data, as a fraction of its span.
const Y_MARGIN: f64 = 0.05;
/// Largest magnitude of data the y axis is fitted to.
const Y_LIMIT: f64 = f64::MAX / 4.0;

/// Series colours, cycled in input order.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Builds the single-line plot title.
///
/// ```rust
/// use fnplot::{compose_title, Range};
///
/// let range = Range::new(-10.0, 10.0).unwrap();
/// assert_eq!(compose_title("sin(x)", &range), "sin(x)   |   x in [-10.0, 10.0]");
/// ```
pub fn compose_title(joined: &str, range: &Range) -> String {
    let bounds = format!(
        "x in [{}, {}]",
        format_bound(range.xmin()),
        format_bound(range.xmax())
    );
    let title = format!("{joined}   |   {bounds}");
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title;
    }
    let head: String = joined.chars().take(TITLE_EXPRESSION_CHARS).collect();
    format!("{head}... |   {bounds}")
}

/// Shortest round-trip form of a bound, with a signed two-digit exponent (`1e+20`,
/// `1e-05`) once it switches to scientific notation.
fn format_bound(value: f64) -> String {
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// Visible y interval for a set of series.
pub fn y_axis_range(series: &[SeriesResult]) -> AxisRange<f64> {
    let bounds = series
        .iter()
        .filter_map(SeriesResult::y_bounds)
        .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)));

    let Some((lo, hi)) = bounds else {
        return -1.0..1.0;
    };
    // padded bounds must stay finite or the mesh never terminates
    let (lo, hi) = (lo.clamp(-Y_LIMIT, Y_LIMIT), hi.clamp(-Y_LIMIT, Y_LIMIT));
    if lo == hi {
        let pad = (lo.abs() * Y_MARGIN).max(0.5);
        return lo - pad..hi + pad;
    }
    let pad = (hi - lo) * Y_MARGIN;
    lo - pad..hi + pad
}

/// Everything needed to draw one plot, already sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_range: AxisRange<f64>,
    pub y_range: AxisRange<f64>,
    pub series: Vec<SeriesResult>,
}

impl Figure {
    /// Validates, compiles and samples a request.
    ///
    /// # Errors
    /// The first `PlotError` met: range validation, then the expressions in order.
    pub fn sample(request: &PlotRequest, backend: Backend) -> Result<Self, PlotError> {
        let range = request.range()?;
        let expressions = request.expressions();
        let functions = expressions.compile(backend)?;
        let grid = SampleGrid::new(range);

        let series = expressions
            .iter()
            .zip(&functions)
            .map(|(expression, function)| -> Result<SeriesResult, PlotError> {
                let ys = function.eval_grid(grid.xs())?;
                Ok(SeriesResult::from_samples(expression.cleaned(), &grid, ys)?)
            })
            .collect::<Result<Vec<_>, _>>()?;

        for s in &series {
            debug!(
                "`{}`: {} of {} samples finite",
                s.label(),
                s.finite_count(),
                grid.len()
            );
        }

        Ok(Figure {
            title: compose_title(&expressions.joined(), &range),
            x_range: range.xmin()..range.xmax(),
            y_range: y_axis_range(&series),
            series,
        })
    }

    /// Legend entries, in drawing order.
    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(SeriesResult::label).collect()
    }

    /// Draws the figure onto any plotters backend.
    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), PlotError> {
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT_FAMILY, FONT_SIZE_TITLE))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())?;

        chart
            .configure_mesh()
            .x_desc("x")
            .y_desc("y")
            .bold_line_style(&BLACK.mix(0.15))
            .light_line_style(&BLACK.mix(0.05))
            .axis_desc_style((FONT_FAMILY, FONT_SIZE_AXIS_DESC))
            .label_style((FONT_FAMILY, FONT_SIZE_TICK))
            .draw()?;

        // zero lines
        let zero_style = BLACK.stroke_width(LINE_WIDTH_ZERO);
        if self.y_range.contains(&0.0) {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(self.x_range.start, 0.0), (self.x_range.end, 0.0)],
                zero_style,
            )))?;
        }
        if self.x_range.contains(&0.0) {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(0.0, self.y_range.start), (0.0, self.y_range.end)],
                zero_style,
            )))?;
        }

        for (index, series) in self.series.iter().enumerate() {
            let style = PALETTE[index % PALETTE.len()].stroke_width(LINE_WIDTH_SERIES);
            // a series without drawable segments still gets its legend entry
            chart
                .draw_series(
                    series
                        .segments()
                        .into_iter()
                        .map(|segment| PathElement::new(segment, style)),
                )?
                .label(series.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .label_font((FONT_FAMILY, FONT_SIZE_LEGEND))
            .draw()?;

        Ok(())
    }
}

/// Draws `message` centred on a blank canvas, wrapped to several lines if needed.
pub fn draw_diagnostic<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    message: &str,
) -> Result<(), PlotError> {
    root.fill(&WHITE)?;

    let lines = wrap_words(message, DIAGNOSTIC_LINE_CHARS);
    let (width, height) = root.dim_in_pixel();
    let line_height = FONT_SIZE_MESSAGE + 6;
    let first = height as i32 / 2 - (lines.len() as i32 - 1) * line_height / 2;

    let style = (FONT_FAMILY, FONT_SIZE_MESSAGE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (i, line) in lines.into_iter().enumerate() {
        root.draw(&Text::new(
            line,
            (width as i32 / 2, first + i as i32 * line_height),
            style.clone(),
        ))?;
    }
    Ok(())
}

/// Greedy word wrap by character count; words longer than `width` get their own line.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + 1;
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// An encoded plot, ready to be sent with `PlotImage::CONTENT_TYPE`.
#[derive(Debug)]
pub struct PlotImage {
    bytes: Vec<u8>,
    error: Option<PlotError>,
}

impl PlotImage {
    pub const CONTENT_TYPE: &'static str = "image/png";

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    /// Why the diagnostic image was drawn instead of the plot.
    pub fn error(&self) -> Option<&PlotError> {
        self.error.as_ref()
    }

    pub fn is_diagnostic(&self) -> bool {
        self.error.is_some()
    }
}

/// Renderer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub backend: Backend,
}

/// Turns plot requests into PNG images.
///
/// # Example
///
/// ```rust
/// use fnplot::{PlotImage, PlotRequest, Renderer};
///
/// let renderer = Renderer::default();
/// let image = renderer.render(&PlotRequest::new("sin(x); cos(x)", -5.0, 5.0));
/// assert!(!image.is_diagnostic());
/// assert_eq!(image.content_type(), PlotImage::CONTENT_TYPE);
///
/// let image = renderer.render(&PlotRequest::new("x", 1.0, -1.0));
/// assert!(image.is_diagnostic());
/// assert!(!image.bytes().is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Renderer { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Renders one request. Never fails: errors become a diagnostic image.
    pub fn render(&self, request: &PlotRequest) -> PlotImage {
        match self.try_render(request) {
            Ok(bytes) => PlotImage { bytes, error: None },
            Err(err) => {
                warn!("rendering diagnostic image: {err}");
                PlotImage {
                    bytes: diagnostic_png(&format!("Error: {err}")),
                    error: Some(err),
                }
            }
        }
    }

    /// Renders independent requests in parallel. Output order matches input order.
    pub fn render_many(&self, requests: &[PlotRequest]) -> Vec<PlotImage> {
        requests
            .par_iter()
            .map(|request| self.render(request))
            .collect()
    }

    fn try_render(&self, request: &PlotRequest) -> Result<Vec<u8>, PlotError> {
        fonts::ensure_registered()?;
        let figure = Figure::sample(request, self.options.backend)?;
        draw_png(|root| figure.draw(root))
    }
}

/// Draws into a fresh RGB buffer of the plot size and encodes it.
fn draw_png<F>(draw: F) -> Result<Vec<u8>, PlotError>
where
    F: FnOnce(&DrawingArea<BitMapBackend, Shift>) -> Result<(), PlotError>,
{
    let mut buffer = vec![255u8; (PLOT_WIDTH * PLOT_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (PLOT_WIDTH, PLOT_HEIGHT))
            .into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    encode_png(buffer)
}

fn encode_png(buffer: Vec<u8>) -> Result<Vec<u8>, PlotError> {
    let image = RgbImage::from_raw(PLOT_WIDTH, PLOT_HEIGHT, buffer).ok_or_else(|| {
        PlotError::Encoding("pixel buffer does not match the plot size".to_string())
    })?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| PlotError::Encoding(err.to_string()))?;
    Ok(bytes)
}

/// The diagnostic image, or a blank canvas if even the text cannot be drawn.
fn diagnostic_png(message: &str) -> Vec<u8> {
    let drawn = fonts::ensure_registered()
        .and_then(|()| draw_png(|root| draw_diagnostic(root, message)));
    match drawn {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("diagnostic text could not be drawn, sending a blank image: {err}");
            let blank = vec![255u8; (PLOT_WIDTH * PLOT_HEIGHT * 3) as usize];
            encode_png(blank).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EvalError, ParseError};

    fn decode(image: &PlotImage) -> image::RgbImage {
        image::load_from_memory(image.bytes()).unwrap().to_rgb8()
    }

    fn render(f: &str, xmin: f64, xmax: f64) -> PlotImage {
        Renderer::default().render(&PlotRequest::new(f, xmin, xmax))
    }

    #[test]
    fn test_plot_is_a_png_of_the_plot_size() {
        let image = render("sin(x)", -10.0, 10.0);
        assert!(image.error().is_none());
        assert!(image.bytes().starts_with(b"\x89PNG\r\n\x1a\n"));
        let pixels = decode(&image);
        assert_eq!(pixels.dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
        // something other than background was drawn
        assert!(pixels.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_inverted_range_gives_diagnostic() {
        for (xmin, xmax) in [(1.0, 1.0), (10.0, -10.0)] {
            let image = render("sin(x)", xmin, xmax);
            match image.error() {
                Some(PlotError::Validation(msg)) => assert_eq!(msg, "xmin must be < xmax"),
                other => panic!("unexpected: {other:?}"),
            }
            assert_eq!(decode(&image).dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
        }
    }

    #[test]
    fn test_malformed_bound_gives_diagnostic() {
        let request = PlotRequest::from_query(Some("x"), Some("minus ten"), None);
        let image = Renderer::default().render(&request);
        assert!(matches!(image.error(), Some(PlotError::Validation(_))));
        assert_eq!(decode(&image).dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
    }

    #[test]
    fn test_injection_gives_diagnostic() {
        for text in ["os.system(1)", "__import__('os')", "y+1"] {
            let image = render(text, -10.0, 10.0);
            assert!(
                matches!(image.error(), Some(PlotError::Parse(_))),
                "{text}: {:?}",
                image.error()
            );
            assert_eq!(decode(&image).dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
        }
    }

    #[test]
    fn test_unknown_identifier_in_second_expression() {
        let image = render("sin(x); y", -1.0, 1.0);
        assert!(matches!(
            image.error(),
            Some(PlotError::Parse(ParseError::UnknownIdentifier(_)))
        ));
    }

    #[test]
    fn test_pole_becomes_gap() {
        // the grid hits 0.0 exactly: -1, 0, 1, ..., 798
        let figure = Figure::sample(&PlotRequest::new("1/x", -1.0, 798.0), Backend::Auto).unwrap();
        let values = figure.series[0].values();
        assert_eq!(values[0], Some(-1.0));
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(1.0));
        assert!(figure.y_range.start.is_finite() && figure.y_range.end.is_finite());

        let image = render("1/x", -1.0, 798.0);
        assert!(image.error().is_none());
    }

    #[test]
    fn test_symmetric_range_around_pole() {
        // 800 points over [-10, 10] straddle zero without hitting it
        let figure = Figure::sample(&PlotRequest::new("1/x", -10.0, 10.0), Backend::Auto).unwrap();
        let series = &figure.series[0];
        assert_eq!(series.finite_count(), 800);
        let (lo, hi) = series.y_bounds().unwrap();
        assert!(hi > 79.0 && hi.is_finite());
        assert!(lo < -79.0 && lo.is_finite());
    }

    #[test]
    fn test_values_near_max_still_render() {
        let figure = Figure::sample(&PlotRequest::new("exp(x)", 0.0, 709.78), Backend::Auto).unwrap();
        assert!(figure.y_range.start.is_finite() && figure.y_range.end.is_finite());
        assert!(figure.y_range.end > Y_LIMIT);

        let image = render("exp(x)", 0.0, 709.78);
        assert!(image.error().is_none());
        assert_eq!(decode(&image).dimensions(), (PLOT_WIDTH, PLOT_HEIGHT));
    }

    #[test]
    fn test_domain_errors_are_not_failures() {
        let image = render("log(x); sqrt(x); tan(x)", -5.0, 5.0);
        assert!(image.error().is_none());

        // every sample missing still renders a plot
        let figure = Figure::sample(&PlotRequest::new("log(-1 - x^2)", -5.0, 5.0), Backend::Auto)
            .unwrap();
        assert_eq!(figure.series[0].finite_count(), 0);
        assert_eq!(figure.y_range, -1.0..1.0);
        assert!(render("log(-1 - x^2)", -5.0, 5.0).error().is_none());
    }

    #[test]
    fn test_legend_order() {
        let figure =
            Figure::sample(&PlotRequest::new("sin(x); cos(x)", -3.0, 3.0), Backend::Auto).unwrap();
        assert_eq!(figure.labels(), vec!["sin(x)", "cos(x)"]);

        let figure =
            Figure::sample(&PlotRequest::new(" x**2 ;; x ", -3.0, 3.0), Backend::Auto).unwrap();
        assert_eq!(figure.labels(), vec!["x^2", "x"]);
        assert_eq!(figure.title, "x**2; x   |   x in [-3.0, 3.0]");
    }

    #[test]
    fn test_title_truncation() {
        let range = Range::new(-10.0, 10.0).unwrap();
        let joined = "sin(x); cos(x); x^2 - 1; exp(-x)";
        assert_eq!(
            compose_title(joined, &range),
            "sin(x); cos(x); x^2 - 1; ... |   x in [-10.0, 10.0]"
        );

        let range = Range::new(0.5, 2.0).unwrap();
        assert_eq!(compose_title("x", &range), "x   |   x in [0.5, 2.0]");
    }

    #[test]
    fn test_title_bounds_in_scientific_notation() {
        let range = Range::new(1e20, 1.5e21).unwrap();
        assert_eq!(compose_title("x", &range), "x   |   x in [1e+20, 1.5e+21]");

        let range = Range::new(1e-5, 1e-4).unwrap();
        assert_eq!(compose_title("x", &range), "x   |   x in [1e-05, 0.0001]");

        assert_eq!(format_bound(-2.5e-300), "-2.5e-300");
        assert_eq!(format_bound(1e16), "1e+16");
        assert_eq!(format_bound(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_title_truncation_counts_characters() {
        let range = Range::new(0.0, 1.0).unwrap();
        let joined = "é".repeat(40);
        let title = compose_title(&joined, &range);
        assert_eq!(title, format!("{}... |   x in [0.0, 1.0]", "é".repeat(25)));
    }

    #[test]
    fn test_y_axis_range() {
        let grid = SampleGrid::with_count(Range::new(0.0, 1.0).unwrap(), 3);
        let series = |ys: Vec<f64>| SeriesResult::from_samples("f", &grid, ys).unwrap();

        let r = y_axis_range(&[series(vec![0.0, 5.0, 10.0])]);
        assert!((r.start + 0.5).abs() < 1e-12 && (r.end - 10.5).abs() < 1e-12);

        assert_eq!(y_axis_range(&[series(vec![2.0; 3])]), 1.5..2.5);
        assert_eq!(y_axis_range(&[series(vec![f64::NAN; 3])]), -1.0..1.0);
        assert_eq!(y_axis_range(&[]), -1.0..1.0);

        let r = y_axis_range(&[series(vec![-f64::MAX, 0.0, f64::MAX])]);
        assert!(r.start.is_finite() && r.end.is_finite() && r.start < r.end);

        // finite span, but padding the top would overflow
        let r = y_axis_range(&[series(vec![0.0, 1e307, f64::MAX])]);
        assert!(r.start.is_finite() && r.end.is_finite() && r.start < r.end);

        let r = y_axis_range(&[series(vec![1e300; 3])]);
        assert!(r.start < 1e300 && r.end > 1e300 && r.end.is_finite());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render("sin(x); x^2 / 10", -4.0, 4.0);
        let b = render("sin(x); x^2 / 10", -4.0, 4.0);
        assert_eq!(a.bytes(), b.bytes());

        let a = render("y", -4.0, 4.0);
        let b = render("y", -4.0, 4.0);
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn test_backends_render_identically() {
        let request = PlotRequest::new("exp(-x^2) * cos(4*x); abs(x)^0.5", -3.0, 3.0);
        let jit = Renderer::new(RenderOptions { backend: Backend::Jit }).render(&request);
        let interp = Renderer::new(RenderOptions {
            backend: Backend::Interpreted,
        })
        .render(&request);
        assert_eq!(jit.bytes(), interp.bytes());
    }

    #[test]
    fn test_render_many_keeps_order() {
        let requests = vec![
            PlotRequest::new("sin(x)", -1.0, 1.0),
            PlotRequest::new("x", 1.0, 0.0),
            PlotRequest::new("z", -1.0, 1.0),
            PlotRequest::new("cos(x)", -1.0, 1.0),
        ];
        let images = Renderer::default().render_many(&requests);
        assert_eq!(images.len(), 4);
        assert!(images[0].error().is_none());
        assert!(matches!(images[1].error(), Some(PlotError::Validation(_))));
        assert!(matches!(images[2].error(), Some(PlotError::Parse(_))));
        assert!(images[3].error().is_none());
        assert_eq!(images[0].bytes(), render("sin(x)", -1.0, 1.0).bytes());
    }

    #[test]
    fn test_wrap_words() {
        assert_eq!(wrap_words("", 10), vec![String::new()]);
        assert_eq!(wrap_words("a b c", 10), vec!["a b c"]);
        assert_eq!(wrap_words("aaaa bbbb cccc", 9), vec!["aaaa bbbb", "cccc"]);
        assert_eq!(wrap_words("abcdefghijkl x", 5), vec!["abcdefghijkl", "x"]);
    }

    #[test]
    fn test_diagnostic_draws_text() {
        let image = render("x", 2.0, 1.0);
        let pixels = decode(&image);
        assert!(pixels.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_evaluation_error_kind_is_distinct() {
        let err = PlotError::from(EvalError::OutputLength {
            expected: 800,
            got: 0,
        });
        assert!(matches!(err, PlotError::Evaluation(_)));
        assert!(diagnostic_png(&format!("Error: {err}")).starts_with(b"\x89PNG"));
    }
}
