mod shell;

pub use shell::ShellGitContext;
