//! External collaborators: the `coursetex` converter and the `pandoc`
//! renderer. Both are opaque synchronous subprocesses whose only outputs we
//! consume are files, the exit status and stderr.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Profile;
use crate::utils::error::{TexAltError, TexAltResult};
use crate::utils::files::{document_dir, sibling_with_suffix};

/// A program resolved on `PATH` (or given as a path).
#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub path: PathBuf,
}

/// What a successful run left on stderr.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stderr: String,
}

impl Tool {
    pub fn locate(program: &str) -> TexAltResult<Self> {
        let path = which::which(program).map_err(|_| TexAltError::tool_missing(program))?;
        Ok(Self {
            name: program.to_string(),
            path,
        })
    }

    /// Run to completion in `cwd`. A non-zero exit is an error carrying stderr.
    pub fn run<I, S>(&self, args: I, cwd: &Path) -> TexAltResult<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let shown: Vec<String> = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect();
        log::info!("  $ {} {}", self.name, shown.join(" "));

        let output = Command::new(&self.path)
            .args(&args)
            .current_dir(cwd)
            .output()
            .map_err(TexAltError::io("run", &self.path))?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit {}", code),
                None => "terminated by signal".to_string(),
            };
            log::error!("  command failed ({})", status);
            return Err(TexAltError::tool_failed(&self.name, status, stderr));
        }
        Ok(ToolOutput { stderr })
    }
}

/// Run the stream converter for `variant` and return the generated `.tex`.
///
/// The converter runs from the document's own directory so it can resolve
/// `\input` files; it writes `<stem>.<variant>.tex` beside the source.
pub fn run_converter(converter: &Tool, source: &Path, variant: &str) -> TexAltResult<PathBuf> {
    let file_name = source.file_name().unwrap_or(source.as_os_str());
    converter.run(
        [OsStr::new("--out"), OsStr::new(variant), file_name],
        &document_dir(source),
    )?;

    let generated = sibling_with_suffix(source, &format!(".{}.tex", variant));
    if !generated.is_file() {
        return Err(TexAltError::OutputMissing {
            tool: converter.name.clone(),
            path: generated,
        });
    }
    Ok(generated)
}

/// Render LaTeX `input` to standalone HTML with MathML.
///
/// Image sources are left as file references so alt text can still be
/// matched by basename; see [`embed_resources`] for the inlining pass.
/// Both paths must live in `cwd`; only their file names are passed.
pub fn render_html(
    renderer: &Tool,
    input: &Path,
    output: &Path,
    title: &str,
    profile: &Profile,
    cwd: &Path,
) -> TexAltResult<ToolOutput> {
    let mut args = vec![
        "--from=latex".to_string(),
        "--to=html5".to_string(),
        "--mathml".to_string(),
        "--standalone".to_string(),
    ];
    args.extend(metadata_args(title, profile));
    args.extend(file_args(input, output));
    renderer.run(&args, cwd)
}

/// Re-render finished HTML with CSS, fonts and images inlined.
pub fn embed_resources(
    renderer: &Tool,
    input: &Path,
    output: &Path,
    title: &str,
    profile: &Profile,
    cwd: &Path,
) -> TexAltResult<ToolOutput> {
    let mut args = vec![
        "--from=html".to_string(),
        "--to=html5".to_string(),
        "--mathml".to_string(),
        "--standalone".to_string(),
        "--embed-resources".to_string(),
    ];
    args.extend(metadata_args(title, profile));
    args.extend(file_args(input, output));
    renderer.run(&args, cwd)
}

fn metadata_args(title: &str, profile: &Profile) -> [String; 2] {
    [
        format!("--metadata=title:{}", title),
        format!("--metadata=lang:{}", profile.pdf_lang),
    ]
}

fn file_args(input: &Path, output: &Path) -> [String; 3] {
    let name = |p: &Path| {
        p.file_name()
            .unwrap_or(p.as_os_str())
            .to_string_lossy()
            .into_owned()
    };
    [name(input), "-o".to_string(), name(output)]
}
