// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output pipeline: writes each document's artifacts.
//
// The markdown source is always written. EPUB and DOCX are produced by an
// external converter (pandoc) working on that file; when the converter is
// missing, fails or times out, only the affected format is reported as
// failed and the others still run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pecha_core::error::{PechaError, Result};
use pecha_core::{Document, OutputFormat, PechaConfig};
use pecha_document::CoverGenerator;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Name of the converter binary searched on `PATH`.
pub const CONVERTER_BINARY: &str = "pandoc";

/// Stylesheet file written once into the output directory.
const STYLESHEET_NAME: &str = "epub.css";

/// A file the pipeline produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// A format that could not be produced for one document.
#[derive(Debug)]
pub struct FormatFailure {
    pub format: OutputFormat,
    pub error: PechaError,
}

/// Result of rendering one document.
#[derive(Debug)]
pub struct RenderReport {
    pub name: String,
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<FormatFailure>,
}

impl RenderReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, format: OutputFormat) -> Option<&Path> {
        self.artifacts
            .iter()
            .find(|a| a.format == format)
            .map(|a| a.path.as_path())
    }
}

/// Writes artifacts for documents into one output directory.
pub struct OutputPipeline {
    out_dir: PathBuf,
    config: Arc<PechaConfig>,
    converter: Option<PathBuf>,
    stylesheet: Option<PathBuf>,
    covers: Arc<CoverGenerator>,
    timeout: Duration,
}

impl OutputPipeline {
    /// Prepare `out_dir`: create it, locate the converter and render the
    /// stylesheet when EPUB output is requested.
    #[instrument(skip(config), fields(out_dir = %out_dir.as_ref().display()))]
    pub fn new(out_dir: impl AsRef<Path>, config: Arc<PechaConfig>) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&out_dir)?;

        let wants = |format: OutputFormat| config.output.formats.contains(&format);
        let needs_converter = config.output.formats.iter().any(|f| f.needs_converter());

        let converter = if needs_converter {
            let found = find_converter(config.output.converter_path.as_deref());
            match &found {
                Some(path) => info!(converter = %path.display(), "converter found"),
                None => warn!("{CONVERTER_BINARY} not found; EPUB and DOCX output will be skipped"),
            }
            found
        } else {
            None
        };

        let stylesheet = if wants(OutputFormat::Epub) {
            write_stylesheet(&out_dir, &config)
        } else {
            None
        };

        let covers = if wants(OutputFormat::Epub) {
            CoverGenerator::new(&config)
        } else {
            CoverGenerator::plain(&config)
        };

        Ok(Self {
            timeout: Duration::from_secs(config.output.converter_timeout_secs.max(1)),
            out_dir,
            config,
            converter,
            stylesheet,
            covers: Arc::new(covers),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Produce every configured format for `document`.
    #[instrument(skip(self, document), fields(name = %document.name))]
    pub async fn render(&self, document: &Document) -> RenderReport {
        let mut report = RenderReport {
            name: document.name.clone(),
            artifacts: Vec::new(),
            failures: Vec::new(),
        };

        let markdown = match self.write_markdown(document).await {
            Ok(path) => path,
            Err(error) => {
                warn!(error = %error, "markdown write failed; skipping conversions");
                report.failures.push(FormatFailure {
                    format: OutputFormat::Markdown,
                    error,
                });
                return report;
            }
        };
        report.artifacts.push(Artifact {
            format: OutputFormat::Markdown,
            path: markdown.clone(),
        });

        for &format in &self.config.output.formats {
            if !format.needs_converter() {
                continue;
            }
            match self.convert(format, document, &markdown).await {
                Ok(path) => report.artifacts.push(Artifact { format, path }),
                Err(error) => {
                    warn!(format = ?format, error = %error, "conversion skipped");
                    report.failures.push(FormatFailure { format, error });
                }
            }
        }

        info!(
            artifacts = report.artifacts.len(),
            failures = report.failures.len(),
            "document rendered"
        );
        report
    }

    /// Write `{out}/markdown/{name}.md`.
    pub async fn write_markdown(&self, document: &Document) -> Result<PathBuf> {
        let path = self.artifact_path(OutputFormat::Markdown, &document.name).await?;
        tokio::fs::write(&path, &document.body).await?;
        debug!(path = %path.display(), bytes = document.body.len(), "markdown written");
        Ok(path)
    }

    async fn artifact_path(&self, format: OutputFormat, name: &str) -> Result<PathBuf> {
        let dir = self.out_dir.join(format.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir.join(format!("{name}.{}", format.extension())))
    }

    async fn convert(&self, format: OutputFormat, document: &Document, markdown: &Path) -> Result<PathBuf> {
        let converter = self.converter.as_deref().ok_or_else(|| {
            PechaError::ConverterUnavailable(format!("{CONVERTER_BINARY} is not installed"))
        })?;
        let output = self.artifact_path(format, &document.name).await?;

        let mut args: Vec<String> = vec![
            "-f".into(),
            "markdown".into(),
            "-M".into(),
            format!("title={}", document.title),
        ];
        if let Some(author) = &document.author {
            args.push("-M".into());
            args.push(format!("author={author}"));
        }

        match format {
            OutputFormat::Epub => {
                args.extend(
                    ["-t", "epub3", "--toc-depth=2", "--epub-chapter-level=3"].map(String::from),
                );
                if let Some(css) = &self.stylesheet {
                    args.push("--css".into());
                    args.push(css.display().to_string());
                }
                if let Some(font) = self.document_file(&self.config.output.font_file) {
                    args.push("--epub-embed-font".into());
                    args.push(font.display().to_string());
                }
                if let Some(cover) = self.write_cover(document).await {
                    args.push("--epub-cover-image".into());
                    args.push(cover.display().to_string());
                }
            }
            OutputFormat::Docx => {
                args.extend(["-t", "docx", "--toc-depth=2"].map(String::from));
                if let Some(reference) = self.document_file(&self.config.output.reference_doc) {
                    args.push("--reference-doc".into());
                    args.push(reference.display().to_string());
                }
            }
            OutputFormat::Markdown => return Ok(markdown.to_path_buf()),
        }

        args.push("-o".into());
        args.push(output.display().to_string());
        args.push(markdown.display().to_string());

        run_converter(converter, &args, self.timeout).await?;
        debug!(path = %output.display(), "converted");
        Ok(output)
    }

    /// Write `{out}/covers/{name}.png`; failures leave the EPUB without a cover.
    async fn write_cover(&self, document: &Document) -> Option<PathBuf> {
        let dir = self.out_dir.join("covers");
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(error = %e, "cannot create cover directory");
            return None;
        }
        let path = dir.join(format!("{}.png", document.name));
        let request = document.cover_request();
        let covers = Arc::clone(&self.covers);
        let target = path.clone();

        match tokio::task::spawn_blocking(move || covers.write_png(&request, &target)).await {
            Ok(Ok(())) => Some(path),
            Ok(Err(e)) => {
                warn!(error = %e, "cover generation failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "cover task panicked");
                None
            }
        }
    }

    /// A document file that exists on disk.
    fn document_file(&self, name: &str) -> Option<PathBuf> {
        self.config
            .output
            .document_file(name)
            .filter(|path| path.is_file())
    }
}

async fn run_converter(converter: &Path, args: &[String], timeout: Duration) -> Result<()> {
    let child = Command::new(converter)
        .args(args)
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| {
            PechaError::Conversion(format!(
                "{} timed out after {}s",
                converter.display(),
                timeout.as_secs()
            ))
        })?
        .map_err(|e| PechaError::ConverterUnavailable(format!("{}: {e}", converter.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PechaError::Conversion(format!(
            "{} exited with {}: {}",
            converter.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// The configured converter if it exists, otherwise a `PATH` search.
pub fn find_converter(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.is_file().then(|| path.to_path_buf());
    }
    std::env::var_os("PATH").and_then(search_path)
}

/// First executable converter in the `PATH`-style list `paths`.
fn search_path(paths: impl AsRef<OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(CONVERTER_BINARY, Some(paths), cwd).ok()
}

/// Substitute the font placeholders of the stylesheet template.
pub fn render_stylesheet(template: &str, font_file: &str, font_name: &str) -> String {
    template
        .replace("{{$fontFile}}", font_file)
        .replace("{{$fontName}}", font_name)
}

fn write_stylesheet(out_dir: &Path, config: &PechaConfig) -> Option<PathBuf> {
    let template_path = config.output.document_file(&config.output.stylesheet_template)?;
    let template = match std::fs::read_to_string(&template_path) {
        Ok(template) => template,
        Err(e) => {
            warn!(path = %template_path.display(), error = %e, "stylesheet template unavailable");
            return None;
        }
    };

    let css = render_stylesheet(&template, &config.output.font_file, &config.output.font_name);
    let path = out_dir.join(STYLESHEET_NAME);
    match std::fs::write(&path, css) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot write stylesheet");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        Document {
            name: "I1 title".into(),
            title: "title".into(),
            volume: 1,
            total_volumes: 1,
            author: Some("author".into()),
            inputter: None,
            ocr: false,
            body: "# title\n\n## The Text {.enHeader}\n\nHello\nWorld\n".into(),
        }
    }

    fn config_with(formats: Vec<OutputFormat>, converter: Option<PathBuf>) -> Arc<PechaConfig> {
        let mut config = PechaConfig::default();
        config.output.formats = formats;
        config.output.converter_path = converter;
        Arc::new(config)
    }

    #[tokio::test]
    async fn markdown_is_always_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = OutputPipeline::new(dir.path(), config_with(vec![OutputFormat::Markdown], None))
            .expect("pipeline");

        let report = pipeline.render(&document()).await;
        assert!(report.is_complete());
        let path = report.artifact(OutputFormat::Markdown).expect("markdown");
        assert_eq!(path, dir.path().join("markdown").join("I1 title.md"));
        assert_eq!(
            std::fs::read_to_string(path).expect("read"),
            document().body
        );
    }

    #[tokio::test]
    async fn missing_converter_fails_only_that_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("no-such-pandoc");
        let config = config_with(
            vec![OutputFormat::Markdown, OutputFormat::Epub, OutputFormat::Docx],
            Some(missing),
        );
        let pipeline = OutputPipeline::new(dir.path().join("out"), config).expect("pipeline");
        assert!(!pipeline.has_converter());

        let report = pipeline.render(&document()).await;
        assert!(report.artifact(OutputFormat::Markdown).is_some());
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, PechaError::ConverterUnavailable(_))));
    }

    #[cfg(unix)]
    fn fake_converter(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-pandoc");
        std::fs::write(&path, script).expect("write script");
        let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn converter_output_is_collected() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Touch the file named after -o.
        let script = "#!/bin/sh\nwhile [ \"$#\" -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then touch \"$2\"; fi\n  shift\ndone\n";
        let converter = fake_converter(dir.path(), script);
        let config = config_with(vec![OutputFormat::Markdown, OutputFormat::Docx], Some(converter));
        let pipeline = OutputPipeline::new(dir.path().join("out"), config).expect("pipeline");

        let report = pipeline.render(&document()).await;
        assert!(report.is_complete(), "{:?}", report.failures);
        let docx = report.artifact(OutputFormat::Docx).expect("docx");
        assert!(docx.ends_with("docx/I1 title.docx"));
        assert!(docx.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn converter_failure_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let converter = fake_converter(dir.path(), "#!/bin/sh\necho broken >&2\nexit 3\n");
        let config = config_with(vec![OutputFormat::Markdown, OutputFormat::Epub], Some(converter));
        let pipeline = OutputPipeline::new(dir.path().join("out"), config).expect("pipeline");

        let report = pipeline.render(&document()).await;
        assert!(report.artifact(OutputFormat::Markdown).is_some());
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0].error {
            PechaError::Conversion(detail) => assert!(detail.contains("broken")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stylesheet_placeholders_are_substituted() {
        let css = render_stylesheet(
            "@font-face { font-family: \"{{$fontName}}\"; src: url(\"{{$fontFile}}\"); }",
            "Noto.ttf",
            "Noto",
        );
        assert_eq!(css, "@font-face { font-family: \"Noto\"; src: url(\"Noto.ttf\"); }");
    }

    #[test]
    fn stylesheet_is_rendered_into_the_output_directory() {
        let files = tempfile::tempdir().expect("tempdir");
        std::fs::write(files.path().join("epub.css"), "body { font-family: {{$fontName}}; }")
            .expect("template");
        let out = tempfile::tempdir().expect("tempdir");

        let mut config = PechaConfig::default();
        config.output.document_files_dir = Some(files.path().to_path_buf());
        config.output.font_name = "Jomolhari".into();

        let path = write_stylesheet(out.path(), &config).expect("stylesheet");
        assert_eq!(
            std::fs::read_to_string(path).expect("read"),
            "body { font-family: Jomolhari; }"
        );
    }

    #[test]
    fn configured_converter_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(find_converter(Some(&dir.path().join("missing"))), None);
    }

    #[cfg(unix)]
    #[test]
    fn path_search_skips_files_that_are_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let shadow = tempfile::tempdir().expect("tempdir");
        let real = tempfile::tempdir().expect("tempdir");
        let blocked = shadow.path().join(CONVERTER_BINARY);
        std::fs::write(&blocked, "#!/bin/sh\n").expect("write");
        std::fs::set_permissions(&blocked, std::fs::Permissions::from_mode(0o644)).expect("chmod");
        let runnable = real.path().join(CONVERTER_BINARY);
        std::fs::write(&runnable, "#!/bin/sh\n").expect("write");
        std::fs::set_permissions(&runnable, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let paths = std::env::join_paths([shadow.path(), real.path()]).expect("join paths");
        assert_eq!(search_path(&paths), Some(runnable));
    }
}
