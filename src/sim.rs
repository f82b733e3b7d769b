use std::{cell::RefCell, collections::VecDeque, rc::Rc};

/// A piece of hardware advanced one cycle at a time.
///
/// `update` returns true while the component still has work to do; the
/// runner stops once every component reports idle in the same cycle.
pub trait SimComponent {
    type SharedStatus;
    fn update(&mut self, shared_status: &mut Self::SharedStatus, current_cycle: usize) -> bool;
}

pub trait Connectable: SimComponent + Sized {
    fn connect<T>(self, other: T) -> AndSim<Self, T>
    where
        T: SimComponent<SharedStatus = Self::SharedStatus> + Sized,
    {
        AndSim::new(self, other)
    }
}

impl<T> Connectable for T where T: SimComponent + Sized {}

/// Two components updated back to back in the same cycle.
#[derive(Debug)]
pub struct AndSim<A, B>
where
    A: SimComponent,
    B: SimComponent<SharedStatus = A::SharedStatus>,
{
    a: A,
    b: B,
}

impl<A, B> AndSim<A, B>
where
    A: SimComponent,
    B: SimComponent<SharedStatus = A::SharedStatus>,
{
    pub fn new(a: A, b: B) -> AndSim<A, B> {
        AndSim { a, b }
    }
}

impl<A, B> SimComponent for AndSim<A, B>
where
    A: SimComponent,
    B: SimComponent<SharedStatus = A::SharedStatus>,
{
    type SharedStatus = A::SharedStatus;
    fn update(&mut self, shared_status: &mut Self::SharedStatus, current_cycle: usize) -> bool {
        let a_busy = self.a.update(shared_status, current_cycle);
        let b_busy = self.b.update(shared_status, current_cycle);
        a_busy || b_busy
    }
}

impl<T> SimComponent for Vec<T>
where
    T: SimComponent,
{
    type SharedStatus = T::SharedStatus;
    fn update(&mut self, shared_status: &mut Self::SharedStatus, current_cycle: usize) -> bool {
        self.iter_mut().fold(false, |busy, component| {
            component.update(shared_status, current_cycle) || busy
        })
    }
}

/// Drives a component tree until every component goes idle.
#[derive(Debug)]
pub struct SimRunner<T, S> {
    sim: T,
    shared_status: S,
    current_cycle: usize,
}

impl<T, S> SimRunner<T, S>
where
    T: SimComponent<SharedStatus = S>,
{
    pub fn new(sim: T, shared_status: S) -> SimRunner<T, S> {
        SimRunner {
            sim,
            shared_status,
            current_cycle: 0,
        }
    }
    pub fn run(&mut self) {
        while self.sim.update(&mut self.shared_status, self.current_cycle) {
            self.current_cycle += 1;
        }
    }
    pub fn get_current_cycle(&self) -> usize {
        self.current_cycle
    }
    pub fn into_inner(self) -> (T, S, usize) {
        (self.sim, self.shared_status, self.current_cycle)
    }
}

/// Sending half of a bounded single-threaded sim channel.
#[derive(Debug)]
pub struct SimSender<T> {
    queue: Rc<RefCell<VecDeque<T>>>,
    capacity: usize,
}

impl<T> Clone for SimSender<T> {
    fn clone(&self) -> SimSender<T> {
        SimSender {
            queue: self.queue.clone(),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug)]
pub struct SimReceiver<T> {
    queue: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Clone for SimReceiver<T> {
    fn clone(&self) -> SimReceiver<T> {
        SimReceiver {
            queue: self.queue.clone(),
        }
    }
}

/// A request/response port pair as seen from one side of a link.
#[derive(Debug)]
pub struct InOutPort<T> {
    pub in_port: SimReceiver<T>,
    pub out_port: SimSender<T>,
}

impl<T> Clone for InOutPort<T> {
    fn clone(&self) -> InOutPort<T> {
        InOutPort {
            in_port: self.in_port.clone(),
            out_port: self.out_port.clone(),
        }
    }
}

impl<T> SimSender<T> {
    /// send fails and hands the message back when the queue is full
    pub fn send(&self, data: T) -> Result<(), T> {
        let mut queue = self.queue.borrow_mut();
        if queue.len() >= self.capacity {
            return Err(data);
        }
        queue.push_back(data);
        Ok(())
    }
}

impl<T> SimReceiver<T> {
    pub fn recv(&self) -> Result<T, ()> {
        self.queue.borrow_mut().pop_front().ok_or(())
    }
}

#[derive(Debug, Default)]
pub struct ChannelBuilder;

impl ChannelBuilder {
    pub fn new() -> ChannelBuilder {
        ChannelBuilder
    }
    pub fn sim_channel<T>(&self, queue_len: usize) -> (SimSender<T>, SimReceiver<T>) {
        let queue = Rc::new(RefCell::new(VecDeque::with_capacity(queue_len)));
        (
            SimSender {
                queue: queue.clone(),
                capacity: queue_len,
            },
            SimReceiver { queue },
        )
    }
    pub fn in_out_port<T>(&self, queue_len: usize) -> (InOutPort<T>, InOutPort<T>) {
        let (sender1, receiver1) = self.sim_channel::<T>(queue_len);
        let (sender2, receiver2) = self.sim_channel::<T>(queue_len);
        (
            InOutPort {
                in_port: receiver1,
                out_port: sender2,
            },
            InOutPort {
                in_port: receiver2,
                out_port: sender1,
            },
        )
    }
    pub fn in_out_port_array<T>(
        &self,
        queue_len: usize,
        num_ports: usize,
    ) -> (Vec<InOutPort<T>>, Vec<InOutPort<T>>) {
        let mut near = Vec::with_capacity(num_ports);
        let mut far = Vec::with_capacity(num_ports);
        for _ in 0..num_ports {
            let (a, b) = self.in_out_port(queue_len);
            near.push(a);
            far.push(b);
        }
        (near, far)
    }
}
