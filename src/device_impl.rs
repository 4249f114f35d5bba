use crate::checksum;
use crate::hw_def::*;
use crate::protocol::*;
use crate::types::*;

use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as I2cError, I2c},
};

// TODO: track the device state in the type (SingleShot/Periodic) so that stop_periodic and
// read_sample can only be called when they make sense.
impl<I2C, Delay, E> Sht3x<I2C, Delay>
where
    I2C: I2c<Error = E>,
    E: I2cError,
    Delay: DelayNs,
{
    /// Create a new SHT3x driver instance. No bus traffic happens until [`Sht3x::init`].
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

    /// Platform bus bring-up and teardown to run from [`Sht3x::init`] and [`Sht3x::deinit`]
    pub fn with_bus_hooks(mut self, init: Option<BusHook<I2C>>, deinit: Option<BusHook<I2C>>) -> Self {
        self.bus_init = init;
        self.bus_deinit = deinit;
        self
    }

    /// Destroy driver instance, return I²C bus and delay instances
    pub fn destroy(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, cmd: u16) -> Result<(), Error<E>> {
        trace!("sht3x::command(): addr={:#x} cmd={:#x}", self.i2c_addr.as_u8(), cmd);
        self.i2c.write(self.i2c_addr.as_u8(), &cmd.to_be_bytes()).map_err(Error::I2c)
    }

    /// Bring up the bus and put the device in a known state: single-shot mode, low
    /// repeatability, freshly soft-reset.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        if let Some(bus_init) = self.bus_init {
            bus_init(&mut self.i2c).map_err(Error::I2c)?;
        }
        self.mode = Mode::SingleShot(Repeatability::Low);
        self.command(Command::StopPeriodic as u16)?;
        self.soft_reset()
    }

    /// Run the bus teardown hook, if any
    pub fn deinit(&mut self) -> Result<(), Error<E>> {
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

    /// Mode the next [`Sht3x::read_sample`] will read in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stop any periodic acquisition and measure once per read from now on
    pub fn set_single_shot(&mut self, repeatability: Repeatability) -> Result<(), Error<E>> {
        self.command(Command::StopPeriodic as u16)?;
        self.mode = Mode::SingleShot(repeatability);
        Ok(())
    }

    /// Start periodic acquisition
    pub fn set_periodic(&mut self, speed: Speed, repeatability: Repeatability) -> Result<(), Error<E>> {
        self.command(periodic_command(speed, repeatability))?;
        self.mode = Mode::Periodic(speed, repeatability);
        Ok(())
    }

    /// Start accelerated response time acquisition
    pub fn set_art(&mut self) -> Result<(), Error<E>> {
        self.command(Command::Art as u16)?;
        self.mode = Mode::Art;
        Ok(())
    }

    /// Stop periodic or ART acquisition without changing the mode reads are made in
    pub fn stop_periodic(&mut self) -> Result<(), Error<E>> {
        self.command(Command::StopPeriodic as u16)
    }

    /// Read one sample in the current mode
    pub fn read_sample(&mut self) -> Result<Sample, Error<E>> {
        let mut sample = Sample::default();
        self.read_sample_into(&mut sample)?;
        Ok(sample)
    }

    /// Read one sample in the current mode into `sample`.
    ///
    /// On [`Error::CrcMismatch`] the raw counts in `sample` are updated but must not be trusted.
    pub fn read_sample_into(&mut self, sample: &mut Sample) -> Result<(), Error<E>> {
        let mut buf = [0u8; MEASUREMENT_LEN];
        let cmd = read_command(self.mode);
        match self.mode {
            Mode::SingleShot(_) => {
                self.single_shot(cmd, &mut buf)?;
                if is_empty_response(&buf) {
                    warn!("sht3x::read_sample_into(): empty single-shot response");
                    return Err(Error::EmptyResponse);
                }
            }
            Mode::Periodic(..) | Mode::Art => {
                self.command(cmd)?;
                self.i2c.read(self.i2c_addr.as_u8(), &mut buf).map_err(fetch_error)?;
            }
        }
        decode_measurement(&buf, self.crc_check, sample)
    }

    #[cfg(feature = "clock-stretching")]
    fn single_shot(&mut self, cmd: u16, buf: &mut [u8; MEASUREMENT_LEN]) -> Result<(), Error<E>> {
        trace!("sht3x::single_shot(): cmd={:#x}, clock stretching", cmd);
        self.i2c
            .write_read(self.i2c_addr.as_u8(), &cmd.to_be_bytes(), buf)
            .map_err(Error::I2c)
    }

    #[cfg(not(feature = "clock-stretching"))]
    fn single_shot(&mut self, cmd: u16, buf: &mut [u8; MEASUREMENT_LEN]) -> Result<(), Error<E>> {
        self.command(cmd)?;
        let mut attempt = 1;
        loop {
            match self.i2c.read(self.i2c_addr.as_u8(), buf) {
                Ok(()) => return Ok(()),
                Err(i2c_err) => {
                    trace!("sht3x::single_shot(): conversion pending, attempt {}", attempt);
                    self.delay.delay_ms(SINGLE_SHOT_RETRY_DELAY_MS);
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
    pub fn read_status(&mut self) -> Result<StatusBits, Error<E>> {
        let mut buf = [0u8; STATUS_LEN];
        self.command(Command::StatusRead as u16)?;
        self.i2c.read(self.i2c_addr.as_u8(), &mut buf).map_err(Error::I2c)?;
        decode_status(&buf, self.crc_check)
    }

    /// Clear the alert and reset flags of the status register
    pub fn clear_status(&mut self) -> Result<(), Error<E>> {
        self.command(Command::StatusClear as u16)
    }

    /// Condensation heater
    pub fn set_heater(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let cmd = if enabled { Command::HeaterEnable } else { Command::HeaterDisable };
        self.command(cmd as u16)
    }

    /// software reset
    pub fn soft_reset(&mut self) -> Result<(), Error<E>> {
        self.command(Command::SoftReset as u16)?;
        self.delay.delay_ms(SOFT_RESET_DELAY_MS);
        Ok(())
    }
}
