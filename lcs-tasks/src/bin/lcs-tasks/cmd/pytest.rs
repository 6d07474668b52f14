use crate::util::common_options::{ProjectOptions, TaskContext};
use crate::util::shell::Invocation;

const PYTEST: &str = "pytest";
/// Peripheral test suite run against the target.
const GPIO_SUITE: &str = "LCSAte/gpio/test_gpio.py";

/// Runs the on-target peripheral tests.
#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    pub project: ProjectOptions,
}

impl Cmd {
    pub fn run(self, ctx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        for project in self.project.projects()? {
            tracing::debug!("Testing peripherals of {project}");
            ctx.run(pytest_invocation())?;
        }
        Ok(())
    }
}

pub fn pytest_invocation() -> Invocation {
    Invocation::new(PYTEST).arg("-v").arg(GPIO_SUITE).arg("-s")
}
