use crate::config::settings::LanguageConfig;
use crate::config::types::{EvalError, Result};
use crate::judge::adapter::{Invocation, InvocationRecipe, SOURCE_PLACEHOLDER};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const S: &str = SOURCE_PLACEHOLDER;

/// Built-in runtime table: (language, extension, program, args).
/// An empty program means the language can be generated but not run here.
const BUILTIN_RUNTIMES: &[(&str, &str, &str, &[&str])] = &[
    ("go", "go", "go", &["run", S]),
    ("python", "py", "python3", &[S]),
    ("javascript", "js", "node", &[S]),
    ("java", "java", "java", &[S]),
    ("scala", "scala", "", &[]),
    ("kotlin", "kt", "", &[]),
    ("groovy", "groovy", "groovy", &[S]),
    ("clojure", "clj", "", &[]),
    ("csharp", "cs", "", &[]),
    ("fsharp", "fs", "", &[]),
    ("swift", "swift", "swift", &[S]),
    ("objectivec", "m", "", &[]),
    ("r", "r", "Rscript", &[S]),
    ("haskell", "hs", "runghc", &[S]),
    ("ocaml", "ml", "ocaml", &[S]),
    ("racket", "rkt", "racket", &[S]),
    ("scheme", "scm", "", &[]),
    ("ruby", "rb", "ruby", &[S]),
    ("erlang", "erl", "escript", &[S]),
    ("elixir", "ex", "elixir", &[S]),
    ("rust", "rs", "", &[]),
    ("c", "c", "", &[]),
    ("cpp", "cpp", "", &[]),
    ("zig", "zig", "zig", &["run", S]),
    ("fortran90", "f90", "", &[]),
    ("perl", "pl", "perl", &[S]),
    ("pascal", "pas", "", &[]),
    ("crystal", "cr", "crystal", &["run", S]),
    ("julia", "jl", "julia", &[S]),
    ("lua", "lua", "lua", &[S]),
    ("php", "php", "php", &[S]),
    ("dart", "dart", "dart", &["run", S]),
    ("bash", "sh", "bash", &[S]),
    ("awk", "awk", "awk", &["-f", S]),
    ("nim", "nim", "nim", &["r", "--hints:off", S]),
    ("d", "d", "rdmd", &[S]),
    ("v", "v", "v", &["run", S]),
    ("prolog", "pl", "", &[]),
    ("tcl", "tcl", "tclsh", &[S]),
    ("coffeescript", "coffee", "coffee", &[S]),
    ("typescript", "ts", "", &[]),
];

/// One language's entry: extension always, recipe only when runnable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSpec {
    pub language: String,
    pub extension: String,
    pub recipe: Option<InvocationRecipe>,
}

/// Immutable language id -> runtime table.
#[derive(Debug, Clone)]
pub struct RuntimeRegistry {
    runtimes: BTreeMap<String, RuntimeSpec>,
}

impl RuntimeRegistry {
    pub fn builtin() -> Self {
        let runtimes = BUILTIN_RUNTIMES
            .iter()
            .map(|(language, extension, program, args)| {
                let recipe = (!program.is_empty()).then(|| InvocationRecipe::new(program, args));
                (
                    language.to_string(),
                    RuntimeSpec {
                        language: language.to_string(),
                        extension: extension.to_string(),
                        recipe,
                    },
                )
            })
            .collect();
        Self { runtimes }
    }

    /// Built-in table with config.json entries layered on top.
    pub fn with_overrides(overrides: &HashMap<String, LanguageConfig>) -> Self {
        let mut registry = Self::builtin();
        for (language, runtime) in overrides {
            let recipe = runtime.program.as_ref().map(|program| InvocationRecipe {
                program: program.clone(),
                args: runtime.args.clone(),
            });
            log::info!(
                "Runtime override for '{}': .{} {}",
                language,
                runtime.extension,
                recipe
                    .as_ref()
                    .map(|r| r.program.as_str())
                    .unwrap_or("(not runnable)")
            );
            registry.runtimes.insert(
                language.clone(),
                RuntimeSpec {
                    language: language.clone(),
                    extension: runtime.extension.clone(),
                    recipe,
                },
            );
        }
        registry
    }

    pub fn get(&self, language: &str) -> Option<&RuntimeSpec> {
        self.runtimes.get(language)
    }

    pub fn extension_for(&self, language: &str) -> Result<&str> {
        self.get(language)
            .map(|spec| spec.extension.as_str())
            .ok_or_else(|| EvalError::UnsupportedLanguage(language.to_string()))
    }

    pub fn invocation_for(&self, language: &str, source: &Path) -> Result<Invocation> {
        self.get(language)
            .and_then(|spec| spec.recipe.as_ref())
            .map(|recipe| recipe.expand(source))
            .ok_or_else(|| EvalError::UnsupportedLanguage(language.to_string()))
    }

    /// Languages that have an invocation recipe, sorted.
    pub fn runnable_languages(&self) -> impl Iterator<Item = &str> {
        self.runtimes
            .values()
            .filter(|spec| spec.recipe.is_some())
            .map(|spec| spec.language.as_str())
    }

    pub fn languages(&self) -> impl Iterator<Item = &RuntimeSpec> {
        self.runtimes.values()
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
