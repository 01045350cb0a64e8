use certpress::{
    BulkSignReport, CertPressError, CertificateRenderer, CertificateRequest, Config,
    IssuedCertificate, PdfInspectReport, PdfSigner, RenderMetrics, inspect_pdf_path, sign_all,
    signed_path,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "certpress", version, about = "Render and sign certificate PDFs")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a certificate from a JSON request into the output directory.
    Render { request: PathBuf },
    /// Sign one PDF with the configured credential.
    Sign {
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sign every certificate listed in a JSON manifest.
    BulkSign { manifest: PathBuf },
    /// Print structural facts about a PDF.
    Inspect { file: PathBuf },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderSummary<'a> {
    path: &'a Path,
    template: &'a Path,
    warnings: Vec<String>,
    metrics: &'a RenderMetrics,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignSummary<'a> {
    path: &'a Path,
    sha256: &'a str,
    bytes: usize,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CertPressError> {
    let raw = std::fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|err| {
        CertPressError::InvalidConfiguration(format!("{}: {}", path.display(), err))
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CertPressError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CertPressError::InvalidConfiguration(err.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn render(config: &Config, request_path: &Path, json: bool) -> Result<(), CertPressError> {
    let request: CertificateRequest = read_json(request_path)?;
    let renderer = CertificateRenderer::from_config(config);
    let rendered = renderer.render_to_file(&request)?;
    let warnings: Vec<String> = rendered
        .output
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect();
    if json {
        return print_json(&RenderSummary {
            path: &rendered.path,
            template: &rendered.output.template,
            warnings,
            metrics: &rendered.output.metrics,
        });
    }
    println!("{}", rendered.path.display());
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

fn sign(
    config: &Config,
    input: &Path,
    out: Option<PathBuf>,
    json: bool,
) -> Result<(), CertPressError> {
    let bytes = std::fs::read(input)?;
    let signed = PdfSigner::from_config(config).sign(&bytes)?;
    let out = out.unwrap_or_else(|| signed_path(input));
    std::fs::write(&out, &signed.bytes)?;
    if json {
        return print_json(&SignSummary {
            path: &out,
            sha256: &signed.sha256,
            bytes: signed.bytes.len(),
        });
    }
    println!("{}  {}", signed.sha256, out.display());
    Ok(())
}

fn bulk_sign(config: &Config, manifest: &Path, json: bool) -> Result<BulkSignReport, CertPressError> {
    let items: Vec<IssuedCertificate> = read_json(manifest)?;
    let report = sign_all(&PdfSigner::from_config(config), &items);
    if json {
        print_json(&report)?;
    } else {
        for outcome in &report.outcomes {
            match (&outcome.signed_path, &outcome.error) {
                (Some(path), _) => println!("ok    {}  {}", outcome.certificate_number, path.display()),
                (None, Some(err)) => println!("fail  {}  {}", outcome.certificate_number, err),
                (None, None) => println!("fail  {}", outcome.certificate_number),
            }
        }
        println!("{} signed, {} failed", report.succeeded, report.failed);
    }
    Ok(report)
}

fn inspect(file: &Path, json: bool) -> Result<(), CertPressError> {
    let report: PdfInspectReport =
        inspect_pdf_path(file).map_err(|err| CertPressError::Pdf(err.to_string()))?;
    if json {
        return print_json(&report);
    }
    println!("version:      {}", report.pdf_version);
    println!("pages:        {}", report.page_count);
    println!("encrypted:    {}", report.encrypted);
    println!("form fields:  {}", report.form_field_count);
    println!("signatures:   {}", report.signature_count);
    println!("size:         {} bytes", report.file_size_bytes);
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode, CertPressError> {
    let config = Config::from_env()?;
    match cli.command {
        Commands::Render { request } => render(&config, &request, cli.json)?,
        Commands::Sign { input, out } => sign(&config, &input, out, cli.json)?,
        Commands::BulkSign { manifest } => {
            let report = bulk_sign(&config, &manifest, cli.json)?;
            if report.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect { file } => inspect(&file, cli.json)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certpress=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
