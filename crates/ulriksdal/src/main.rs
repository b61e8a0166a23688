#![forbid(unsafe_code)]

//! Ulriksdal CLI: print, validate, sign and verify SAML documents.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;
use ulriksdal::keys::loader::load_key_file;
use ulriksdal::keys::Key;
use ulriksdal::saml::views::Assertion;
use ulriksdal::saml::SignatureContext;
use ulriksdal::{
    default_registry, Document, ElementKind, Error, NodeId, SignatureParams, TypeRegistry,
    UnmarshallerConfig, ValidationMode, ValidatorSuite,
};

#[derive(Parser)]
#[command(
    name = "ulriksdal",
    about = "Ulriksdal: SAML object model with enveloped XML signatures",
    version
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a document and print it back
    Print {
        /// Input XML file
        file: PathBuf,

        /// Run the schema validators and report every violation
        #[arg(long)]
        validate: bool,

        /// Skip unknown elements and attributes instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Sign the document's root element
    Sign {
        /// Input XML file
        file: PathBuf,

        /// Private key (PEM or DER)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Certificate to embed in KeyInfo (PEM or DER)
        #[arg(long)]
        cert: Option<PathBuf>,

        /// SignatureMethod algorithm URI (default depends on the key)
        #[arg(long)]
        algorithm: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify every signature in a document
    Verify {
        /// Input XML file
        file: PathBuf,

        /// Public or private key (PEM or DER)
        #[arg(short = 'k', long, conflicts_with = "cert", required_unless_present = "cert")]
        key: Option<PathBuf>,

        /// X.509 certificate (PEM or DER)
        #[arg(long)]
        cert: Option<PathBuf>,
    },

    /// List registered element types and supported algorithms
    Info,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Print {
            file,
            validate,
            lenient,
        } => cmd_print(&file, validate, lenient),
        Commands::Sign {
            file,
            key,
            cert,
            algorithm,
            output,
        } => cmd_sign(&file, &key, cert.as_deref(), algorithm, output),
        Commands::Verify { file, key, cert } => cmd_verify(&file, key.or(cert)),
        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_print(file: &Path, validate: bool, lenient: bool) -> Result<(), Error> {
    let registry = default_registry()?;
    let config = if lenient {
        UnmarshallerConfig::lenient()
    } else {
        UnmarshallerConfig::default()
    };
    let (doc, root) = load_file(&registry, file, config)?;

    if validate {
        ValidatorSuite::new(&registry)
            .with_mode(ValidationMode::CollectAll)
            .validate_tree(&doc, root)?;
        tracing::info!(file = %file.display(), "document is schema valid");
    }

    println!("{}", ulriksdal::to_xml_pretty(&doc, &registry, root)?);
    Ok(())
}

fn cmd_sign(
    file: &Path,
    key_path: &Path,
    cert_path: Option<&Path>,
    algorithm: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let registry = default_registry()?;
    let (mut doc, root) = load_file(&registry, file, UnmarshallerConfig::default())?;

    let mut key = load_key_file(key_path)?;
    if !key.has_private() {
        return Err(Error::Key(format!("{} holds no private key", key_path.display())));
    }
    if let Some(path) = cert_path {
        key = attach_certificate(key, &load_key_file(path)?)?;
    }

    let mut params = SignatureParams::default();
    if let Some(uri) = algorithm {
        params = params.with_signature_method(uri);
    }

    tracing::info!(file = %file.display(), "signing root element");
    let marshalled = ulriksdal::sign_node(&mut doc, &registry, root, &key, params)?;
    let xml = ulriksdal::xml::to_string(&marshalled.element)?;
    write_output(output, xml.as_bytes())
}

fn cmd_verify(file: &Path, key_path: Option<PathBuf>) -> Result<(), Error> {
    let key_path = key_path.ok_or_else(|| Error::KeyNotFound("pass --key or --cert".into()))?;
    let registry = default_registry()?;
    let (doc, root) = load_file(&registry, file, UnmarshallerConfig::default())?;
    let key = load_key_file(&key_path)?;

    let signed: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| {
            doc.signature(n)
                .and_then(SignatureContext::signed_signature)
                .is_some()
        })
        .collect();
    if signed.is_empty() {
        return Err(Error::Unsigned(format!("{} contains no signature", file.display())));
    }

    for node in signed {
        ulriksdal::verify(&doc, &registry, node, &key)?;
        let name = doc.node(node)?.name();
        println!("OK {} #{}", name, doc.id(node).unwrap_or_default());
        if doc.node(node)?.is(ElementKind::Assertion) {
            if let Some(issuer) = Assertion::new(&doc, node)?.issuer().and_then(|i| i.value()) {
                tracing::info!(issuer, "verified assertion");
            }
        }
    }
    Ok(())
}

fn cmd_info() -> Result<(), Error> {
    let registry = default_registry()?;
    println!("Ulriksdal: SAML object model with enveloped XML signatures");
    println!();
    println!("Registered element types: {}", registry.len());
    for kind in ElementKind::ALL {
        println!("  {}", kind.qname());
    }
    println!();
    println!("Supported digest algorithms:");
    println!("  SHA-1, SHA-224, SHA-256, SHA-384, SHA-512");
    println!();
    println!("Supported signature algorithms:");
    println!("  RSA PKCS#1 v1.5 (SHA-1, SHA-256, SHA-384, SHA-512)");
    println!("  ECDSA P-256/P-384 (SHA-256, SHA-384)");
    println!("  HMAC (SHA-1, SHA-256, SHA-384, SHA-512)");
    println!();
    println!("Supported canonicalization:");
    println!("  Exclusive C14N 1.0 (±comments)");
    println!();
    println!("Supported key formats:");
    println!("  PEM, DER (RSA, EC), X.509 certificates");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn load_file(
    registry: &TypeRegistry,
    path: &Path,
    config: UnmarshallerConfig,
) -> Result<(Document, NodeId), Error> {
    let xml = std::fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("{}: {e}", path.display())))?;
    let mut doc = Document::new();
    let root = ulriksdal::load(&mut doc, registry, &xml, config)?;
    Ok((doc, root))
}

/// Attach the certificate chain of `cert` to `key` after checking that both
/// carry the same public key.
fn attach_certificate(mut key: Key, cert: &Key) -> Result<Key, Error> {
    if cert.x509_chain.is_empty() {
        return Err(Error::Certificate("certificate file holds no certificate".into()));
    }
    if !cert.same_public_key(&key) {
        return Err(Error::Key("certificate does not match the private key".into()));
    }
    key.x509_chain = cert.x509_chain.clone();
    Ok(key)
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|e| Error::Other(format!("{}: {e}", p.display()))),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(data)
                .map_err(|e| Error::Other(format!("stdout: {e}")))
        }
    }
}
