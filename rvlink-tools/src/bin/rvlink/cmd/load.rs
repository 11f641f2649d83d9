use crate::config::Config;
use crate::util::common_options::SerialOptions;
use crate::util::parse_u32;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(flatten)]
    serial: SerialOptions,

    /// The address to write, e.g. 0x2000
    #[clap(value_parser = parse_u32)]
    address: u32,

    /// The word to write
    #[clap(value_parser = parse_u32)]
    data: u32,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut client = self.serial.connect(&config.serial)?;

        client.load(self.address, self.data)?;

        Ok(())
    }
}
