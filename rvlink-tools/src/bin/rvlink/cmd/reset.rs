use crate::config::Config;
use crate::util::common_options::SerialOptions;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut client = self.serial.connect(&config.serial)?;

        client.reset()?;

        Ok(())
    }
}
