mod array;
mod bitcellarray;
mod dummyarray;
mod replicacolumn;
mod budget;
mod replicabitcellarray;

pub use array::*;
pub use bitcellarray::*;
pub use dummyarray::*;
pub use replicacolumn::*;
pub use budget::*;
pub use replicabitcellarray::*;

use std::{any::Any, collections::HashMap, fmt::Debug};
use tracing::debug;
use crate::layout::Layout;
use crate::{ErrorContext, LpRamResult};
use super::{Circuit, CircuitError, CircuitFactory, Design, Instance, LeafKind, ModuleArg, Net, Pin, Port, PortDirection, Shr, ShrString};

pub trait Modular: Design {
    fn instances(&self) -> &[Shr<Instance>];
    fn circuits(&self) -> &[Shr<Circuit>];
    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug)]
pub struct Module<A> {
    pub name: ShrString,
    pub ports: Vec<Shr<Port>>,
    pub instances: Vec<Shr<Instance>>,
    pub circuits: Vec<Shr<Circuit>>,
    pub nets: HashMap<ShrString, Shr<Net>>,
    pub layout: Option<Layout>,
    pub args: A,
    instance_lookup: HashMap<ShrString, usize>,
}

pub trait AsInstance<A> {
    fn as_instance(self, module: &Module<A>) -> Result<Shr<Instance>, CircuitError>;
}

pub trait AsPin {
    fn as_pin(self, instance: &Shr<Instance>) -> Result<Shr<Pin>, CircuitError>;
}

impl<A> Module<A> {
    pub fn new<S: Into<ShrString>>(name: S, args: A) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            instances: Vec::new(),
            circuits: Vec::new(),
            nets: HashMap::new(),
            layout: None,
            args,
            instance_lookup: HashMap::new(),
        }
    }

    pub fn add_port<S: Into<ShrString>>(&mut self, name: S, direction: PortDirection) -> Result<Shr<Port>, CircuitError> {
        let name: ShrString = name.into();
        if self.ports.iter().any(|port| port.read().name == name) {
            return Err(CircuitError::AddDuplicatePort(name.to_string()));
        }

        debug!("add port {} to circuit {}", name, self.name);
        // add a port and net with the same name
        let port = Port::new(name.clone(), direction);
        let net = self.add_net(name);
        port.write().set_connected_net(net.clone());
        net.write().add_connection(port.clone());
        self.ports.push(port.clone());
        Ok(port)
    }

    pub fn add_module(&mut self, arg: impl ModuleArg + 'static, factory: &mut CircuitFactory) -> LpRamResult<Shr<Circuit>> {
        let module = factory.module(arg)
            .with_context(|| format!("add sub module to circuit {}", self.name))?;
        self.add_circuit(module.clone());
        Ok(module)
    }

    pub fn add_leafcell(&mut self, kind: LeafKind, port_size: usize, factory: &CircuitFactory) -> LpRamResult<Shr<Circuit>> {
        let leafcell = factory.leafcell(kind, port_size)
            .with_context(|| format!("add leaf cell to circuit {}", self.name))?;
        self.add_circuit(leafcell.clone());
        Ok(leafcell)
    }

    pub fn add_circuit(&mut self, circuit: Shr<Circuit>) {
        if !self.circuits.iter().any(|c| c.ptr_eq(&circuit)) {
            self.circuits.push(circuit);
        }
    }

    pub fn add_instance<S: Into<ShrString>>(&mut self, name: S, circuit: Shr<Circuit>) -> Result<Shr<Instance>, CircuitError> {
        let name: ShrString = name.into();
        if self.instance_lookup.contains_key(&name) {
            return Err(CircuitError::AddDuplicateInstance(name.to_string()));
        }

        debug!("add instance {} to circuit {}", name, self.name);
        let instance = Instance::new(name.clone(), circuit);
        self.instance_lookup.insert(name, self.instances.len());
        self.instances.push(instance.clone());
        Ok(instance)
    }

    pub fn get_instance(&self, name: &str) -> Option<Shr<Instance>> {
        self.instance_lookup.get(name).map(|index| self.instances[*index].clone())
    }

    pub fn add_net<S: Into<ShrString>>(&mut self, name: S) -> Shr<Net> {
        let name: ShrString = name.into();
        self.nets.entry(name.clone())
            .or_insert_with(|| Net::new(name))
            .clone()
    }

    /// Ties the pins of `instance`, in the template's pin order, to `nets`.
    pub fn connect_instance_in_order<T, S, I>(&mut self, instance: T, nets: I) -> LpRamResult<()>
    where
        T: AsInstance<A>,
        S: Into<ShrString>,
        I: IntoIterator<Item = S>,
    {
        let instance = instance.as_instance(self)?;
        let nets: Vec<ShrString> = nets.into_iter().map(Into::into).collect();
        let instance_name = instance.read().name.clone();

        let pins = instance.read().pins.clone();
        (|| -> Result<(), CircuitError> {
            if pins.len() != nets.len() {
                return Err(CircuitError::PinSizeUnmatch(pins.len(), nets.len()));
            }
            debug!("connect instance {} in circuit {}", instance_name, self.name);
            for (pin, net) in pins.into_iter().zip(nets) {
                self.connect_pin_with_net(instance.clone(), pin, net)?;
            }
            Ok(())
        })()
        .with_context(|| format!("connect instance {} in circuit {}", instance_name, self.name))
    }

    pub fn connect_pin_with_net(&mut self, instance: impl AsInstance<A>, pin: impl AsPin, net: impl Into<ShrString>) -> Result<Shr<Net>, CircuitError> {
        let instance = instance.as_instance(self)?;
        let pin = pin.as_pin(&instance)?;
        let net_name: ShrString = net.into();

        // a supply pin landing on a port must land on a port of the same class
        let direction = pin.read().direction();
        if direction.is_supply() {
            if let Some(port) = self.ports.iter().find(|port| port.read().name == net_name) {
                if port.read().direction.class() != direction.class() {
                    return Err(CircuitError::SupplyMismatch(
                        pin.read().name.to_string(), instance.read().name.to_string(), net_name.to_string(),
                    ));
                }
            }
        }

        let net = self.add_net(net_name);
        pin.write().set_connected_net(net.clone());
        net.write().add_connection(pin.clone());
        Ok(net)
    }

    /// Netlist of every instance as `(instance name, template name, nets in pin order)`.
    pub fn connection_table(&self) -> Result<Vec<(ShrString, ShrString, Vec<ShrString>)>, CircuitError> {
        self.instances.iter()
            .map(|instance| {
                let instance = instance.read();
                Ok((instance.name.clone(), instance.template_name(), instance.connection_names()?))
            })
            .collect()
    }
}

impl<A: Debug> Design for Module<A> {
    fn name(&self) -> ShrString {
        self.name.clone()
    }

    fn ports(&self) -> &[Shr<Port>] {
        &self.ports
    }

    fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }
}

impl<A: Debug + 'static> Modular for Module<A> {
    fn instances(&self) -> &[Shr<Instance>] {
        &self.instances
    }

    fn circuits(&self) -> &[Shr<Circuit>] {
        &self.circuits
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<A> AsInstance<A> for Shr<Instance> {
    fn as_instance(self, _: &Module<A>) -> Result<Self, CircuitError> {
        Ok(self)
    }
}

impl<A> AsInstance<A> for &Shr<Instance> {
    fn as_instance(self, _: &Module<A>) -> Result<Shr<Instance>, CircuitError> {
        Ok(self.clone())
    }
}

impl<A> AsInstance<A> for &str {
    fn as_instance(self, module: &Module<A>) -> Result<Shr<Instance>, CircuitError> {
        module.get_instance(self)
            .ok_or_else(|| CircuitError::InstanceNotFound(self.to_string(), module.name.to_string()))
    }
}

impl AsPin for &str {
    fn as_pin(self, instance: &Shr<Instance>) -> Result<Shr<Pin>, CircuitError> {
        instance.read()
            .get_pin(self)
            .ok_or_else(|| CircuitError::PinNotFound(self.to_string(), instance.read().name.to_string()))
    }
}

impl AsPin for Shr<Pin> {
    fn as_pin(self, _: &Shr<Instance>) -> Result<Shr<Pin>, CircuitError> {
        Ok(self)
    }
}

impl AsPin for &Shr<Pin> {
    fn as_pin(self, _: &Shr<Instance>) -> Result<Shr<Pin>, CircuitError> {
        Ok(self.clone())
    }
}
