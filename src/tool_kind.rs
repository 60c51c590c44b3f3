//! Tool kind enum identifying the developer toolchains the scanner checks.

use strum::IntoEnumIterator;

/// One candidate invocation used to probe a tool's version.
///
/// A tool is checked by trying each of its candidates in order until one
/// produces output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeCommand {
    /// Executable name, resolved against PATH at probe time.
    pub program: &'static str,
    /// Arguments passed to the executable.
    pub args: &'static [&'static str],
}

impl ProbeCommand {
    const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }
}

/// A developer tool the environment scanner knows how to detect.
///
/// The declaration order of the variants is the registration order of the
/// detectors, and therefore the order of `tools` in every
/// [`ScanReport`](crate::ScanReport). Adding a variant changes the report
/// length; reordering variants changes the report order.
///
/// # Example
///
/// ```rust
/// use envscan_daemon::ToolKind;
///
/// for kind in ToolKind::all() {
///     let first = &kind.candidates()[0];
///     println!("{}: {} {:?}", kind.display_name(), first.program, first.args);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
#[non_exhaustive]
pub enum ToolKind {
    /// Node.js runtime (`node`)
    Node,
    /// npm package manager
    Npm,
    /// Yarn package manager
    Yarn,
    /// pnpm package manager
    Pnpm,
    /// Python interpreter (`python3`, then `python`)
    Python,
    /// pip package manager (`pip`, then `pip3`)
    Pip,
    /// PHP interpreter
    Php,
    /// Composer package manager
    Composer,
    /// .NET SDK (`dotnet`)
    DotNet,
    /// Java runtime (`java --version`, then the legacy `java -version`)
    Java,
    /// Git
    Git,
    /// Docker CLI
    Docker,
    /// Go toolchain
    Go,
    /// Rust compiler (`rustc`)
    Rust,
    /// Cargo
    Cargo,
}

const NODE: &[ProbeCommand] = &[ProbeCommand::new("node", &["--version"])];
const NPM: &[ProbeCommand] = &[ProbeCommand::new("npm", &["--version"])];
const YARN: &[ProbeCommand] = &[ProbeCommand::new("yarn", &["--version"])];
const PNPM: &[ProbeCommand] = &[ProbeCommand::new("pnpm", &["--version"])];
const PYTHON: &[ProbeCommand] = &[
    ProbeCommand::new("python3", &["--version"]),
    ProbeCommand::new("python", &["--version"]),
];
const PIP: &[ProbeCommand] = &[
    ProbeCommand::new("pip", &["--version"]),
    ProbeCommand::new("pip3", &["--version"]),
];
const PHP: &[ProbeCommand] = &[ProbeCommand::new("php", &["--version"])];
const COMPOSER: &[ProbeCommand] = &[ProbeCommand::new("composer", &["--version"])];
const DOTNET: &[ProbeCommand] = &[ProbeCommand::new("dotnet", &["--version"])];
const JAVA: &[ProbeCommand] = &[
    ProbeCommand::new("java", &["--version"]),
    ProbeCommand::new("java", &["-version"]),
];
const GIT: &[ProbeCommand] = &[ProbeCommand::new("git", &["--version"])];
const DOCKER: &[ProbeCommand] = &[ProbeCommand::new("docker", &["--version"])];
const GO: &[ProbeCommand] = &[ProbeCommand::new("go", &["version"])];
const RUST: &[ProbeCommand] = &[ProbeCommand::new("rustc", &["--version"])];
const CARGO: &[ProbeCommand] = &[ProbeCommand::new("cargo", &["--version"])];

impl ToolKind {
    /// Ordered candidate invocations for this tool. Never empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use envscan_daemon::ToolKind;
    ///
    /// let python = ToolKind::Python.candidates();
    /// assert_eq!(python[0].program, "python3");
    /// assert_eq!(python[1].program, "python");
    /// ```
    pub fn candidates(&self) -> &'static [ProbeCommand] {
        match self {
            Self::Node => NODE,
            Self::Npm => NPM,
            Self::Yarn => YARN,
            Self::Pnpm => PNPM,
            Self::Python => PYTHON,
            Self::Pip => PIP,
            Self::Php => PHP,
            Self::Composer => COMPOSER,
            Self::DotNet => DOTNET,
            Self::Java => JAVA,
            Self::Git => GIT,
            Self::Docker => DOCKER,
            Self::Go => GO,
            Self::Rust => RUST,
            Self::Cargo => CARGO,
        }
    }

    /// Stable name reported as `ToolInfo::name`.
    ///
    /// ```rust
    /// use envscan_daemon::ToolKind;
    ///
    /// assert_eq!(ToolKind::Node.display_name(), "Node.js");
    /// assert_eq!(ToolKind::DotNet.display_name(), ".NET SDK");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Node => "Node.js",
            Self::Npm => "npm",
            Self::Yarn => "Yarn",
            Self::Pnpm => "pnpm",
            Self::Python => "Python",
            Self::Pip => "pip",
            Self::Php => "PHP",
            Self::Composer => "Composer",
            Self::DotNet => ".NET SDK",
            Self::Java => "Java",
            Self::Git => "Git",
            Self::Docker => "Docker",
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Cargo => "Cargo",
        }
    }

    /// Iterator over all registered tools, in registration order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Number of registered tools.
    pub const COUNT: usize = <Self as strum::EnumCount>::COUNT;
}
