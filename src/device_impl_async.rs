use crate::checksum;
use crate::hw_def::*;
use crate::protocol::*;
use crate::types::*;

use embedded_hal_async::{
    delay::DelayNs,
    i2c::{Error as I2cError, I2c},
};

impl<I2C, Delay, E> Sht3xAsync<I2C, Delay>
where
    I2C: I2c<Error = E>,
    E: I2cError,
    Delay: DelayNs,
{
    /// Create a new SHT3x driver instance. No bus traffic happens until [`Sht3xAsync::init`].
    pub fn new(i2c: I2C, delay: Delay, i2c_addr: I2cAddr) -> Self {
        Self {
            i2c,
            delay,
            i2c_addr,
            mode: Mode::default(),
            crc_check: checksum::ignore,
            bus_init: None,
            bus_deinit: None,
        }
    }

    /// Validate received words with `crc_check`, e.g. [`checksum::verify`]
    pub fn with_crc_check(mut self, crc_check: CrcCheck) -> Self {
        self.crc_check = crc_check;
        self
    }

    /// Platform bus bring-up and teardown to run from `init` and `deinit`
    pub fn with_bus_hooks(mut self, init: Option<BusHook<I2C>>, deinit: Option<BusHook<I2C>>) -> Self {
        self.bus_init = init;
        self.bus_deinit = deinit;
        self
    }

    /// Destroy driver instance, return I²C bus and delay instances
    pub fn destroy(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    async fn command(&mut self, cmd: u16) -> Result<(), Error<E>> {
        trace!("sht3x::command(): addr={:#x} cmd={:#x}", self.i2c_addr.as_u8(), cmd);
        self.i2c.write(self.i2c_addr.as_u8(), &cmd.to_be_bytes()).await.map_err(Error::I2c)
    }

    /// Bring up the bus and put the device in a known state: single-shot mode, low
    /// repeatability, freshly soft-reset.
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        if let Some(bus_init) = self.bus_init {
            bus_init(&mut self.i2c).map_err(Error::I2c)?;
        }
        self.mode = Mode::SingleShot(Repeatability::Low);
        self.command(Command::StopPeriodic as u16).await?;
        self.soft_reset().await
    }

    /// Run the bus teardown hook, if any
    pub async fn deinit(&mut self) -> Result<(), Error<E>> {
        match self.bus_deinit {
            Some(bus_deinit) => bus_deinit(&mut self.i2c).map_err(Error::I2c),
            None => Ok(()),
        }
    }

    /// Current bus address
    pub fn address(&self) -> I2cAddr {
        self.i2c_addr
    }

    /// Talk to the device at another address from now on
    pub fn set_address(&mut self, i2c_addr: I2cAddr) {
        self.i2c_addr = i2c_addr;
    }

    /// Mode the next read will be made in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stop any periodic acquisition and measure once per read from now on
    pub async fn set_single_shot(&mut self, repeatability: Repeatability) -> Result<(), Error<E>> {
        self.command(Command::StopPeriodic as u16).await?;
        self.mode = Mode::SingleShot(repeatability);
        Ok(())
    }

    /// Start periodic acquisition
    pub async fn set_periodic(&mut self, speed: Speed, repeatability: Repeatability) -> Result<(), Error<E>> {
        self.command(periodic_command(speed, repeatability)).await?;
        self.mode = Mode::Periodic(speed, repeatability);
        Ok(())
    }

    /// Start accelerated response time acquisition
    pub async fn set_art(&mut self) -> Result<(), Error<E>> {
        self.command(Command::Art as u16).await?;
        self.mode = Mode::Art;
        Ok(())
    }

    /// Stop periodic or ART acquisition without changing the mode reads are made in
    pub async fn stop_periodic(&mut self) -> Result<(), Error<E>> {
        self.command(Command::StopPeriodic as u16).await
    }

    /// Read one sample in the current mode
    pub async fn read_sample(&mut self) -> Result<Sample, Error<E>> {
        let mut sample = Sample::default();
        self.read_sample_into(&mut sample).await?;
        Ok(sample)
    }

    /// Read one sample in the current mode into `sample`.
    ///
    /// On [`Error::CrcMismatch`] the raw counts in `sample` are updated but must not be trusted.
    pub async fn read_sample_into(&mut self, sample: &mut Sample) -> Result<(), Error<E>> {
        let mut buf = [0u8; MEASUREMENT_LEN];
        let cmd = read_command(self.mode);
        match self.mode {
            Mode::SingleShot(_) => {
                self.single_shot(cmd, &mut buf).await?;
                if is_empty_response(&buf) {
                    warn!("sht3x::read_sample_into(): empty single-shot response");
                    return Err(Error::EmptyResponse);
                }
            }
            Mode::Periodic(..) | Mode::Art => {
                self.command(cmd).await?;
                self.i2c.read(self.i2c_addr.as_u8(), &mut buf).await.map_err(fetch_error)?;
            }
        }
        decode_measurement(&buf, self.crc_check, sample)
    }

    #[cfg(feature = "clock-stretching")]
    async fn single_shot(&mut self, cmd: u16, buf: &mut [u8; MEASUREMENT_LEN]) -> Result<(), Error<E>> {
        trace!("sht3x::single_shot(): cmd={:#x}, clock stretching", cmd);
        self.i2c
            .write_read(self.i2c_addr.as_u8(), &cmd.to_be_bytes(), buf)
            .await
            .map_err(Error::I2c)
    }

    #[cfg(not(feature = "clock-stretching"))]
    async fn single_shot(&mut self, cmd: u16, buf: &mut [u8; MEASUREMENT_LEN]) -> Result<(), Error<E>> {
        self.command(cmd).await?;
        let mut attempt = 1;
        loop {
            match self.i2c.read(self.i2c_addr.as_u8(), buf).await {
                Ok(()) => return Ok(()),
                Err(i2c_err) => {
                    trace!("sht3x::single_shot(): conversion pending, attempt {}", attempt);
                    self.delay.delay_ms(SINGLE_SHOT_RETRY_DELAY_MS).await;
                    if attempt == SINGLE_SHOT_READ_ATTEMPTS {
                        warn!("sht3x::single_shot(): no response after {} attempts", attempt);
                        return Err(Error::I2c(i2c_err));
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Read the status register
    pub async fn read_status(&mut self) -> Result<StatusBits, Error<E>> {
        let mut buf = [0u8; STATUS_LEN];
        self.command(Command::StatusRead as u16).await?;
        self.i2c.read(self.i2c_addr.as_u8(), &mut buf).await.map_err(Error::I2c)?;
        decode_status(&buf, self.crc_check)
    }

    /// Clear the alert and reset flags of the status register
    pub async fn clear_status(&mut self) -> Result<(), Error<E>> {
        self.command(Command::StatusClear as u16).await
    }

    /// Condensation heater
    pub async fn set_heater(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let cmd = if enabled { Command::HeaterEnable } else { Command::HeaterDisable };
        self.command(cmd as u16).await
    }

    /// software reset
    pub async fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.command(Command::SoftReset as u16).await?;
        self.delay.delay_ms(SOFT_RESET_DELAY_MS).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = 0x44;

    #[derive(Default)]
    struct DelayLog(Vec<u32>);
    impl DelayNs for DelayLog {
        async fn delay_ns(&mut self, _ns: u32) {}
        async fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    fn sht3x(expectations: &[Transaction]) -> Sht3xAsync<I2cMock, DelayLog> {
        Sht3xAsync::new(I2cMock::new(expectations), DelayLog::default(), I2cAddr::A)
    }

    fn done(sht3x: Sht3xAsync<I2cMock, DelayLog>) -> Vec<u32> {
        let (mut i2c, delay) = sht3x.destroy();
        i2c.done();
        delay.0
    }

    #[test]
    fn periodic_scenario() {
        let mut sht3x = sht3x(&[
            Transaction::write(ADDR, vec![0x30, 0x93]),
            Transaction::write(ADDR, vec![0x30, 0xA2]),
            Transaction::write(ADDR, vec![0x21, 0x30]),
            Transaction::write(ADDR, vec![0xE0, 0x00]),
            Transaction::read(ADDR, vec![0x66, 0x2E, 0xFF, 0x7D, 0x13, 0xFF]),
        ]);
        block_on(sht3x.init()).unwrap();
        block_on(sht3x.set_periodic(Speed::Mps1, Repeatability::High)).unwrap();
        let sample = block_on(sht3x.read_sample()).unwrap();
        assert_eq!(sample, Sample::from_raw(26158, 32019));
        assert_eq!(done(sht3x), vec![2]);
    }

    #[test]
    fn periodic_nack_is_no_data() {
        let mut sht3x = sht3x(&[
            Transaction::write(ADDR, vec![0x2B, 0x32]),
            Transaction::write(ADDR, vec![0xE0, 0x00]),
            Transaction::read(ADDR, vec![0; 6]).with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
        ]);
        block_on(sht3x.set_art()).unwrap();
        assert!(matches!(block_on(sht3x.read_sample()), Err(Error::NoData)));
        assert!(done(sht3x).is_empty());
    }

    #[cfg(not(feature = "clock-stretching"))]
    #[test]
    fn single_shot_gives_up_after_twenty_attempts() {
        let mut expectations = vec![Transaction::write(ADDR, vec![0x24, 0x0B])];
        for _ in 0..20 {
            expectations.push(Transaction::read(ADDR, vec![0; 6]).with_error(ErrorKind::Other));
        }
        let mut sht3x = sht3x(&expectations);
        sht3x.mode = Mode::SingleShot(Repeatability::Medium);
        assert!(matches!(block_on(sht3x.read_sample()), Err(Error::I2c(ErrorKind::Other))));
        assert_eq!(done(sht3x), vec![1; 20]);
    }

    fn reject(_word: u16, _crc: u8) -> bool {
        false
    }

    #[test]
    fn crc_mismatch_keeps_raw_counts() {
        let mut sht3x = sht3x(&[
            Transaction::write(ADDR, vec![0xE0, 0x00]),
            Transaction::read(ADDR, vec![0x66, 0x2E, 0xFF, 0x7D, 0x13, 0xFF]),
            Transaction::write(ADDR, vec![0xF3, 0x2D]),
            Transaction::read(ADDR, vec![0x80, 0x10, 0xE1]),
        ])
        .with_crc_check(reject);
        sht3x.mode = Mode::Periodic(Speed::Mps10, Repeatability::Low);
        let mut sample = Sample::default();
        assert!(matches!(block_on(sht3x.read_sample_into(&mut sample)), Err(Error::CrcMismatch)));
        assert_eq!(sample.temperature_raw, 0x662E);
        assert_eq!(sample.humidity_raw, 0x7D13);
        assert!(matches!(block_on(sht3x.read_status()), Err(Error::CrcMismatch)));
        done(sht3x);
    }

    #[cfg(not(feature = "clock-stretching"))]
    #[test]
    fn single_shot_empty_response() {
        let mut sht3x = sht3x(&[
            Transaction::write(ADDR, vec![0x24, 0x00]),
            Transaction::read(ADDR, vec![0x66, 0x2E, 0x00, 0x7D, 0x13, 0x00]),
        ]);
        sht3x.mode = Mode::SingleShot(Repeatability::High);
        assert!(matches!(block_on(sht3x.read_sample()), Err(Error::EmptyResponse)));
        assert!(done(sht3x).is_empty());
    }

    #[test]
    fn status_and_heater() {
        let mut sht3x = sht3x(&[
            Transaction::write(ADDR, vec![0x30, 0x6D]),
            Transaction::write(ADDR, vec![0xF3, 0x2D]),
            Transaction::read(ADDR, vec![0x20, 0x00, 0xFF]),
        ]);
        block_on(sht3x.set_heater(true)).unwrap();
        let status = block_on(sht3x.read_status()).unwrap();
        assert!(status.heater_on);
        done(sht3x);
    }
}
