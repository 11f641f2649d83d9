use rvlink::channel::serial::list_ports;

#[derive(clap::Parser)]
pub struct Cmd {}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let ports = list_ports()?;

        if ports.is_empty() {
            println!("No serial ports were found.");
            return Ok(());
        }

        println!("The following serial ports were found:");
        for port in ports {
            match port.description {
                Some(description) => println!("{} -- {description}", port.name),
                None => println!("{}", port.name),
            }
        }

        Ok(())
    }
}
