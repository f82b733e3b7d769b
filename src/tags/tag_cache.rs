use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::sim::{InOutPort, SimComponent, SimSender};

use super::{
    pending::PendingQueue, store::ShepherdTags, MemReq, SimStatus, Writeback, WritebackList,
};

/// Cycle-level front end of the Shepherd cache.
///
/// Requests arrive on one port per requester. A hit answers after the
/// latency the tag store reports; a miss allocates the line immediately and
/// answers once the fill returns, with later requests to the same line
/// riding along. Dirty victims leave through the writeback sender.
pub struct ShepherdTagCache {
    pub tags: ShepherdTags,
    pub req_ports: Vec<InOutPort<MemReq>>,
    pub wb_sender: SimSender<MemReq>,
    pub miss_latency: usize,
    line_to_reqs: BTreeMap<u64, Vec<MemReq>>,
    in_flight: PendingQueue<u64>,
    ready_reqs: VecDeque<MemReq>,
    writebacks: VecDeque<Writeback>,
}

impl ShepherdTagCache {
    pub fn new(
        tags: ShepherdTags,
        req_ports: Vec<InOutPort<MemReq>>,
        wb_sender: SimSender<MemReq>,
        miss_latency: usize,
    ) -> Self {
        ShepherdTagCache {
            tags,
            req_ports,
            wb_sender,
            miss_latency,
            line_to_reqs: BTreeMap::new(),
            in_flight: PendingQueue::new(),
            ready_reqs: VecDeque::new(),
            writebacks: VecDeque::new(),
        }
    }

    fn handle_request(&mut self, req: MemReq, status: &mut SimStatus, current_cycle: usize) {
        let line = self.tags.block_align(req.addr);
        let (blk, lat) = self.tags.access(req.addr, req.owner, current_cycle);
        match blk {
            Some(blk) => {
                status.statistics.update_hit();
                if req.is_write {
                    self.tags.block_mut(blk).dirty = true;
                }
                debug!(addr = req.addr, lat, "cache hit");
                match self.line_to_reqs.get_mut(&line) {
                    Some(waiting) => waiting.push(req),
                    None => {
                        self.in_flight.push(line, current_cycle + lat);
                        self.line_to_reqs.insert(line, vec![req]);
                    }
                }
            }
            None => {
                status.statistics.update_miss();
                debug!(addr = req.addr, "cache miss, allocating");
                self.handle_fill(line, &req, current_cycle);
                self.in_flight.push(line, current_cycle + self.miss_latency);
                self.line_to_reqs.entry(line).or_default().push(req);
            }
        }
    }

    /// pick a victim, queue its writeback if dirty, and fill the line
    fn handle_fill(&mut self, line: u64, req: &MemReq, current_cycle: usize) {
        let mut writebacks = WritebackList::new();
        let victim = self.tags.find_victim(line, &mut writebacks);
        let vblk = self.tags.block(victim);
        if vblk.valid && vblk.dirty {
            let addr = self.tags.regenerate_block_addr(vblk.tag, victim.set);
            let owner = vblk.owner.expect("dirty block with no owner");
            debug!(addr, "evicting dirty line");
            writebacks.push(Writeback { addr, owner });
        }
        self.tags.insert_block(line, victim, req.owner, current_cycle);
        let blk = self.tags.block_mut(victim);
        blk.valid = true;
        blk.dirty = req.is_write;
        blk.when_ready = current_cycle + self.miss_latency;
        self.writebacks.extend(writebacks);
    }
}

impl SimComponent for ShepherdTagCache {
    type SharedStatus = SimStatus;
    fn update(&mut self, shared_status: &mut Self::SharedStatus, current_cycle: usize) -> bool {
        let mut busy = !self.in_flight.is_empty();

        // one request per port per cycle
        for port_index in 0..self.req_ports.len() {
            if let Ok(req) = self.req_ports[port_index].in_port.recv() {
                busy = true;
                self.handle_request(req, shared_status, current_cycle);
            }
        }

        // release the requests whose line is ready
        while let Some((ready_cycle, line)) = self.in_flight.pop() {
            if ready_cycle > current_cycle {
                self.in_flight.push(line, ready_cycle);
                break;
            }
            if let Some(reqs) = self.line_to_reqs.remove(&line) {
                self.ready_reqs.extend(reqs);
            }
        }

        // answers go back out the requester's own port
        while let Some(req) = self.ready_reqs.pop_front() {
            let port = req.owner;
            match self.req_ports[port].out_port.send(req) {
                Ok(_) => busy = true,
                Err(req) => {
                    self.ready_reqs.push_front(req);
                    break;
                }
            }
        }

        // dirty victims drain toward memory
        while let Some(wb) = self.writebacks.pop_front() {
            let req = MemReq {
                addr: wb.addr,
                id: shared_status.next_mem_id(),
                owner: wb.owner,
                is_write: true,
            };
            match self.wb_sender.send(req) {
                Ok(_) => busy = true,
                Err(_) => {
                    self.writebacks.push_front(wb);
                    break;
                }
            }
        }

        busy
    }
}
