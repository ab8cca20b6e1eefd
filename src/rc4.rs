//! RC4 stream cipher (spec component 4.2).
//!
//! Modeled as a tagged phase rather than a reusable value: [`Rc4::schedule`] consumes the key and
//! returns a [`ScheduledRc4`] holding the permutation; [`ScheduledRc4::apply`] consumes *that* and
//! returns the transformed bytes. There is no way to call `apply` twice against the same
//! permutation, since the 256-byte state is moved rather than borrowed — the type system rejects
//! the "forgot to reschedule" bug the spec's design notes (9) call out.

use crate::error::DecryptionError;

/// Key-schedule entry point. Nothing is computed until [`Rc4::schedule`] is called.
pub struct Rc4;

/// An RC4 permutation after key scheduling, ready to transform exactly one input.
pub struct ScheduledRc4 {
    state: [u8; 256],
}

impl Rc4 {
    /// Runs the key-scheduling algorithm (KSA) over `key`, producing a one-shot cipher.
    pub fn schedule(key: &[u8]) -> Result<ScheduledRc4, DecryptionError> {
        if key.is_empty() {
            return Err(DecryptionError::EmptyRc4Key);
        }

        let mut state = [0u8; 256];
        for (i, v) in state.iter_mut().enumerate() {
            *v = i as u8;
        }

        let mut j: u8 = 0;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        Ok(ScheduledRc4 { state })
    }
}

impl ScheduledRc4 {
    /// Runs the PRGA/transform phase over `data`, consuming the permutation. RC4 is a stream
    /// cipher XOR, so this is simultaneously encryption and decryption.
    pub fn apply(mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut x: u8 = 0;
        let mut y: u8 = 0;
        for &byte in data {
            x = x.wrapping_add(1);
            y = y.wrapping_add(self.state[x as usize]);
            self.state.swap(x as usize, y as usize);
            let k = self.state[(self.state[x as usize].wrapping_add(self.state[y as usize])) as usize];
            out.push(byte ^ k);
        }
        out
    }
}

/// Convenience one-shot: schedule `key` and transform `data` in a single call.
pub fn rc4(key: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptionError> {
    Ok(Rc4::schedule(key)?.apply(data))
}
