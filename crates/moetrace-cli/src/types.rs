use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseFilter {
    Prefill,
    Generation,
    Overall,
}

impl PhaseFilter {
    pub fn to_phase(self) -> Option<moetrace_types::Phase> {
        match self {
            PhaseFilter::Prefill => Some(moetrace_types::Phase::Prefill),
            PhaseFilter::Generation => Some(moetrace_types::Phase::Generation),
            PhaseFilter::Overall => None,
        }
    }
}
