use sim_devices::DeviceType;

/// Device types of a circuit, in registration order
#[derive(Default)]
pub struct Circuit {
    pub devices: Vec<Box<dyn DeviceType>>,
}

impl Circuit {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    pub fn add_device(&mut self, device: impl DeviceType + 'static) {
        self.devices.push(Box::new(device));
    }

    pub fn instance_count(&self) -> usize {
        self.devices.iter().map(|d| d.instance_count()).sum()
    }

    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name()).collect()
    }
}

pub fn debug_dump_circuit(circuit: &Circuit) {
    log::debug!(
        "circuit: device_types={} instances={}",
        circuit.devices.len(),
        circuit.instance_count()
    );
}
