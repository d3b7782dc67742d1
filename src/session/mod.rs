//! Editing sessions over a loaded catalogue and sprite atlas.
//!
//! A [`Session`] owns both parsed containers plus everything an edit has
//! changed but not yet written: replacement bitmaps, and the sets of dirty
//! things and sprites. Saving re-encodes only what is dirty and copies the
//! rest from the loaded buffers.
//!
//! Every mutation validates its input before touching any state, so a
//! failed call leaves the session exactly as it was.

mod compact;
mod idspace;

pub use compact::CompactReport;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use tracing::{debug, info};

use crate::codec::{atlas, catalog, container, interchange, Bitmap, LoadOptions};
use crate::error::ThingkitError;
use crate::model::{
    ClientVersion, FrameGroup, ObjectData, SpriteData, SpriteId, Thing, ThingCategory, ThingFlags,
    ThingId,
};
use crate::validation::{validate_flags, validate_frame_groups};

/// The two container buffers produced by [`Session::save`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFiles {
    pub catalogue: Vec<u8>,
    pub sprites: Vec<u8>,
}

/// A catalogue and sprite atlas open for editing.
#[derive(Debug)]
pub struct Session {
    objects: ObjectData,
    sprites: SpriteData,
    /// Replacement bitmaps not yet written. A blank one deletes the sprite.
    overrides: BTreeMap<SpriteId, Bitmap>,
    dirty_things: BTreeSet<ThingId>,
    dirty_sprites: BTreeSet<SpriteId>,
    /// Decoded source sprites.
    sprite_cache: RefCell<HashMap<SpriteId, Bitmap>>,
}

impl Session {
    /// Parses both containers.
    pub fn load(
        catalogue: &[u8],
        sprites: &[u8],
        options: &LoadOptions,
    ) -> Result<Self, ThingkitError> {
        let objects = catalog::parse(catalogue, options)?;
        let sprites = atlas::parse(sprites, options)?;
        Self::from_parts(objects, sprites)
    }

    /// A session over an empty catalogue and atlas.
    pub fn new(version: ClientVersion) -> Self {
        Self {
            objects: ObjectData::new(version),
            sprites: SpriteData::new(version),
            overrides: BTreeMap::new(),
            dirty_things: BTreeSet::new(),
            dirty_sprites: BTreeSet::new(),
            sprite_cache: RefCell::new(HashMap::new()),
        }
    }

    /// A session over already parsed containers.
    pub fn from_parts(objects: ObjectData, sprites: SpriteData) -> Result<Self, ThingkitError> {
        if objects.version != sprites.version {
            return Err(ThingkitError::Format {
                context: "session",
                message: format!(
                    "catalogue is for client {} but sprites are for client {}",
                    objects.version, sprites.version
                ),
            });
        }
        debug!(
            things = objects.things.len(),
            sprites = sprites.sprite_count,
            "opened session"
        );
        Ok(Self {
            objects,
            sprites,
            overrides: BTreeMap::new(),
            dirty_things: BTreeSet::new(),
            dirty_sprites: BTreeSet::new(),
            sprite_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn version(&self) -> ClientVersion {
        self.objects.version
    }

    pub fn objects(&self) -> &ObjectData {
        &self.objects
    }

    pub fn sprites(&self) -> &SpriteData {
        &self.sprites
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.objects.thing(id)
    }

    pub fn sprite_count(&self) -> u32 {
        self.sprites.sprite_count
    }

    /// Inclusive ID range of a category, or `None` when it is empty.
    pub fn category_range(&self, category: ThingCategory) -> Option<RangeInclusive<ThingId>> {
        self.objects.category_range(category)
    }

    /// ID as presented to users: raw for items, 1-based otherwise.
    pub fn display_id(&self, id: ThingId) -> Option<u32> {
        self.objects.display_id(id)
    }

    pub fn dirty_things(&self) -> &BTreeSet<ThingId> {
        &self.dirty_things
    }

    pub fn dirty_sprites(&self) -> &BTreeSet<SpriteId> {
        &self.dirty_sprites
    }

    /// Returns true if a save would differ from the loaded files.
    pub fn is_modified(&self) -> bool {
        !self.dirty_things.is_empty()
            || !self.dirty_sprites.is_empty()
            || !self.overrides.is_empty()
            || self.objects.counts != self.objects.source_counts
            || self.sprites.sprite_count != self.sprites.source_count
    }

    fn thing_mut(&mut self, id: ThingId) -> Result<&mut Thing, ThingkitError> {
        self.objects
            .things
            .get_mut(&id)
            .ok_or(ThingkitError::UnknownThing(id))
    }

    /// Replaces a thing's flags.
    pub fn update_flags(&mut self, id: ThingId, flags: ThingFlags) -> Result<(), ThingkitError> {
        if !self.objects.things.contains_key(&id) {
            return Err(ThingkitError::UnknownThing(id));
        }
        validate_flags(&flags, &self.objects)?;

        let thing = self.thing_mut(id)?;
        thing.flags = flags;
        thing.invalidate_source();
        self.dirty_things.insert(id);
        debug!(%id, "updated flags");
        Ok(())
    }

    /// Replaces a thing's frame groups.
    pub fn set_frame_groups(
        &mut self,
        id: ThingId,
        groups: Vec<FrameGroup>,
    ) -> Result<(), ThingkitError> {
        let category = self
            .objects
            .thing(id)
            .ok_or(ThingkitError::UnknownThing(id))?
            .category;
        validate_frame_groups(self.version(), category, &groups, self.sprites.sprite_count)?;

        let thing = self.thing_mut(id)?;
        thing.frame_groups = groups;
        thing.invalidate_source();
        self.dirty_things.insert(id);
        debug!(%id, "replaced frame groups");
        Ok(())
    }

    /// Pixels of a sprite, including unsaved replacements.
    pub fn sprite_pixels(&self, id: SpriteId) -> Result<Bitmap, ThingkitError> {
        if !self.sprites.contains(id) {
            return Err(ThingkitError::UnknownSprite(id));
        }
        if let Some(bitmap) = self.overrides.get(&id) {
            return Ok(bitmap.clone());
        }
        if let Some(bitmap) = self.sprite_cache.borrow().get(&id) {
            return Ok(bitmap.clone());
        }
        let bitmap = atlas::decode_sprite(&self.sprites, id)?;
        self.sprite_cache.borrow_mut().insert(id, bitmap.clone());
        Ok(bitmap)
    }

    /// Replaces the pixels of an existing sprite.
    pub fn replace_sprite(&mut self, id: SpriteId, bitmap: Bitmap) -> Result<(), ThingkitError> {
        if !self.sprites.contains(id) {
            return Err(ThingkitError::UnknownSprite(id));
        }
        self.sprite_cache.get_mut().remove(&id);
        self.overrides.insert(id, bitmap);
        self.dirty_sprites.insert(id);
        Ok(())
    }

    fn ensure_sprite_capacity(&self, additional: u32) -> Result<(), ThingkitError> {
        let max = atlas::max_sprites(self.version());
        let wanted = u64::from(self.sprites.sprite_count) + u64::from(additional);
        if wanted > u64::from(max) {
            return Err(ThingkitError::Capacity {
                what: "sprites",
                count: wanted,
                max: u64::from(max),
            });
        }
        Ok(())
    }

    fn push_sprite(&mut self, bitmap: Bitmap) -> SpriteId {
        self.sprites.sprite_count += 1;
        self.sprites.addresses.push(0);
        let id = SpriteId(self.sprites.sprite_count);
        self.overrides.insert(id, bitmap);
        self.dirty_sprites.insert(id);
        id
    }

    /// Appends a sprite and returns its ID.
    pub fn add_sprite(&mut self, bitmap: Bitmap) -> Result<SpriteId, ThingkitError> {
        self.ensure_sprite_capacity(1)?;
        let id = self.push_sprite(bitmap);
        debug!(%id, "added sprite");
        Ok(id)
    }

    /// Clears a sprite's pixels. The ID stays valid until the atlas is
    /// compacted.
    pub fn delete_sprite(&mut self, id: SpriteId) -> Result<(), ThingkitError> {
        self.replace_sprite(id, Bitmap::transparent())
    }

    /// Appends a default thing to a category and returns its ID.
    pub fn add_thing(&mut self, category: ThingCategory) -> Result<ThingId, ThingkitError> {
        let id = idspace::allocate(&mut self.objects, &mut self.dirty_things, category)?;
        info!(%id, %category, "added thing");
        Ok(id)
    }

    /// Removes the last thing of its category and returns it.
    pub fn remove_thing(&mut self, id: ThingId) -> Result<Thing, ThingkitError> {
        let thing = idspace::remove(&mut self.objects, &mut self.dirty_things, id)?;
        info!(%id, category = %thing.category, "removed thing");
        Ok(thing)
    }

    /// Encodes a thing and its sprites as an interchange file.
    pub fn export_thing(
        &self,
        id: ThingId,
        version: ClientVersion,
    ) -> Result<Vec<u8>, ThingkitError> {
        let thing = self.objects.thing(id).ok_or(ThingkitError::UnknownThing(id))?;
        let mut pixels = BTreeMap::new();
        for sprite in thing.referenced_sprites() {
            if let std::collections::btree_map::Entry::Vacant(slot) = pixels.entry(sprite) {
                slot.insert(self.sprite_pixels(sprite)?);
            }
        }
        interchange::encode(thing, &pixels, version)
    }

    /// Adds the thing in an interchange file as a new thing of its
    /// category. Every non-blank sprite it carries is appended to the
    /// atlas; slots without pixels become blank.
    pub fn import_thing(&mut self, bytes: &[u8]) -> Result<ThingId, ThingkitError> {
        let decoded = interchange::decode(bytes)?;
        let first_new = self.sprites.sprite_count + 1;
        let remap: BTreeMap<SpriteId, SpriteId> = decoded
            .pixels
            .keys()
            .zip(first_new..)
            .map(|(old, new)| (*old, SpriteId(new)))
            .collect();

        let mut groups = decoded.frame_groups;
        for group in &mut groups {
            for slot in &mut group.sprites {
                *slot = remap.get(slot).copied().unwrap_or(SpriteId::BLANK);
            }
        }

        let added = remap.len() as u32;
        self.ensure_sprite_capacity(added)?;
        validate_frame_groups(
            self.version(),
            decoded.category,
            &groups,
            self.sprites.sprite_count + added,
        )?;

        let id = idspace::allocate(&mut self.objects, &mut self.dirty_things, decoded.category)?;
        for bitmap in decoded.pixels.into_values() {
            self.push_sprite(bitmap);
        }
        let thing = self.thing_mut(id)?;
        thing.flags = decoded.flags;
        thing.frame_groups = groups;

        info!(
            %id,
            category = %decoded.category,
            from_client = %decoded.client_version,
            sprites = added,
            "imported thing"
        );
        Ok(id)
    }

    /// Serializes both containers, re-encoding only what changed.
    ///
    /// The session is left as is; saving twice yields the same bytes.
    pub fn save(&self) -> Result<SavedFiles, ThingkitError> {
        let catalogue = catalog::assemble(&self.objects, &self.dirty_things)?;
        let sprites = atlas::assemble(&self.sprites, &self.overrides, &self.dirty_sprites)?;
        Ok(SavedFiles {
            catalogue: container::reseal(
                catalogue,
                &self.objects.container,
                &self.objects.source,
                &self.objects.original,
            )?,
            sprites: container::reseal(
                sprites,
                &self.sprites.container,
                &self.sprites.source,
                &self.sprites.original,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarketInfo, ThingFlag};

    fn dot() -> Bitmap {
        let mut bitmap = Bitmap::transparent();
        bitmap.set_pixel(3, 4, [9, 8, 7, 255]);
        bitmap
    }

    fn session() -> Session {
        let mut session = Session::new(ClientVersion::new(1098).unwrap());
        session.add_thing(ThingCategory::Item).unwrap();
        session.add_thing(ThingCategory::Outfit).unwrap();
        session
    }

    #[test]
    fn rejected_flag_edit_leaves_state() {
        let mut session = session();
        let saved = session.save().unwrap();
        let bad: ThingFlags = vec![ThingFlag::Market(MarketInfo {
            trade_as: 4242,
            show_as: 100,
            ..Default::default()
        })]
        .into();

        let err = session.update_flags(ThingId(100), bad).unwrap_err();
        assert!(matches!(err, ThingkitError::Validation(_)));
        assert!(session.thing(ThingId(100)).unwrap().flags.is_empty());
        assert_eq!(session.save().unwrap(), saved);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut session = session();
        assert!(matches!(
            session.update_flags(ThingId(500), ThingFlags::new()),
            Err(ThingkitError::UnknownThing(ThingId(500)))
        ));
        assert!(matches!(
            session.replace_sprite(SpriteId(1), dot()),
            Err(ThingkitError::UnknownSprite(SpriteId(1)))
        ));
        assert!(session.sprite_pixels(SpriteId::BLANK).is_err());
    }

    #[test]
    fn sprite_edits_are_visible_before_save() {
        let mut session = session();
        let id = session.add_sprite(dot()).unwrap();
        assert_eq!(id, SpriteId(1));
        assert_eq!(session.sprite_pixels(id).unwrap(), dot());

        session.delete_sprite(id).unwrap();
        assert!(session.sprite_pixels(id).unwrap().is_blank());
        assert_eq!(session.sprite_count(), 1);
    }

    #[test]
    fn frame_groups_must_reference_existing_sprites() {
        let mut session = session();
        let mut group = FrameGroup::single_tile();
        group.sprites = vec![SpriteId(1)];
        assert!(session
            .set_frame_groups(ThingId(100), vec![group.clone()])
            .is_err());

        session.add_sprite(dot()).unwrap();
        session.set_frame_groups(ThingId(100), vec![group]).unwrap();
        assert!(session.dirty_things().contains(&ThingId(100)));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let objects = ObjectData::new(ClientVersion::new(1098).unwrap());
        let sprites = SpriteData::new(ClientVersion::new(860).unwrap());
        assert!(Session::from_parts(objects, sprites).is_err());
    }

    #[test]
    fn export_import_within_session() {
        let mut session = session();
        let sprite = session.add_sprite(dot()).unwrap();
        let mut group = FrameGroup::single_tile();
        group.pattern_x = 2;
        group.sprites = vec![sprite, sprite];
        session.set_frame_groups(ThingId(100), vec![group]).unwrap();

        let bytes = session.export_thing(ThingId(100), session.version()).unwrap();
        let id = session.import_thing(&bytes).unwrap();
        assert_eq!(id, ThingId(101));
        // the outfit moved up
        assert_eq!(
            session.thing(ThingId(102)).unwrap().category,
            ThingCategory::Outfit
        );

        let imported = session.thing(id).unwrap();
        assert_eq!(imported.frame_groups[0].sprites, vec![SpriteId(2), SpriteId(2)]);
        assert_eq!(session.sprite_pixels(SpriteId(2)).unwrap(), dot());
    }
}
