use crate::circuit::{Circuit, CircuitError, Design, Pin, Shr, ShrString};
use crate::layout::Placement;

#[derive(Debug)]
pub struct Instance {
    pub name: ShrString,
    pub template_circuit: Shr<Circuit>,
    pub pins: Vec<Shr<Pin>>,
    pub placement: Option<Placement>,
}

impl Instance {
    pub fn new<S: Into<ShrString>>(name: S, template_circuit: Shr<Circuit>) -> Shr<Instance> {
        let pins = template_circuit.read().ports().iter().map(|port| {
            Pin::new(port.read().name.clone(), port.clone())
        })
        .collect();

        Shr::new(Self { name: name.into(), template_circuit, pins, placement: None })
    }

    pub fn get_pin(&self, name: &str) -> Option<Shr<Pin>> {
        self.pins.iter().find(|pin| pin.read().name == name).cloned()
    }

    pub fn template_name(&self) -> ShrString {
        self.template_circuit.read().name()
    }

    /// Names of the nets on each pin, in the template's pin order.
    pub fn connection_names(&self) -> Result<Vec<ShrString>, CircuitError> {
        self.pins.iter()
            .map(|pin| {
                pin.read()
                    .net_name()
                    .ok_or_else(|| CircuitError::InstanceNotConnected(self.name.to_string()))
            })
            .collect()
    }

    /// The net a pin of this instance is tied to, looked up by pin name.
    pub fn net_of(&self, pin_name: &str) -> Option<ShrString> {
        self.get_pin(pin_name).and_then(|pin| pin.read().net_name())
    }

    pub fn place(&mut self, placement: Placement) {
        self.placement = Some(placement);
    }
}
